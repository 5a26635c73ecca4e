use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::component::Direction;
use crate::entity::{Entity, EntityId, EntityKind, Flag, PropertyValue};
use crate::error::{CoreError, CoreResult};
use crate::query::QueryBuilder;

/// Metadata about the story itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldMeta {
    /// Story title.
    pub title: String,
    /// Author credit.
    #[serde(default)]
    pub author: Option<String>,
    /// Banner text shown when play starts.
    #[serde(default)]
    pub intro: Option<String>,
}

impl WorldMeta {
    /// Metadata with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// The central world model. Owns every entity and the containment forest.
#[derive(Debug, Clone)]
pub struct World {
    /// Story metadata.
    pub meta: WorldMeta,
    entities: BTreeMap<EntityId, Entity>,
    by_kind: BTreeMap<EntityKind, Vec<EntityId>>,
    player: Option<EntityId>,
}

impl World {
    /// Create an empty world.
    pub fn new(meta: WorldMeta) -> Self {
        Self {
            meta,
            entities: BTreeMap::new(),
            by_kind: BTreeMap::new(),
            player: None,
        }
    }

    // -----------------------------------------------------------------------
    // Entity CRUD
    // -----------------------------------------------------------------------

    /// Add an entity to the world. It starts out nowhere; use [`World::place`]
    /// to put it somewhere.
    pub fn add_entity(&mut self, mut entity: Entity) -> CoreResult<EntityId> {
        if self.entities.contains_key(&entity.id) {
            return Err(CoreError::DuplicateId(entity.id));
        }
        entity.location = None;
        entity.contents.clear();

        let id = entity.id.clone();
        if entity.kind == EntityKind::Player {
            if let Some(existing) = &self.player {
                return Err(CoreError::Validation(format!(
                    "second player entity \"{id}\" (already have \"{existing}\")"
                )));
            }
            self.player = Some(id.clone());
        }
        self.by_kind.entry(entity.kind).or_default().push(id.clone());
        self.entities.insert(id.clone(), entity);
        Ok(id)
    }

    /// Get a reference to an entity by ID.
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Like [`World::get`], but a missing entity is an error.
    pub fn entity(&self, id: &EntityId) -> CoreResult<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| CoreError::EntityNotFound(id.clone()))
    }

    /// Like [`World::get_mut`], but a missing entity is an error.
    pub fn entity_mut(&mut self, id: &EntityId) -> CoreResult<&mut Entity> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| CoreError::EntityNotFound(id.clone()))
    }

    /// Whether an entity with this ID exists.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// The player entity's ID, if one has been added.
    pub fn player(&self) -> Option<&EntityId> {
        self.player.as_ref()
    }

    /// The player entity's ID, or a validation error.
    pub fn player_id(&self) -> CoreResult<&EntityId> {
        self.player
            .as_ref()
            .ok_or_else(|| CoreError::Validation("world has no player".to_string()))
    }

    // -----------------------------------------------------------------------
    // Containment
    // -----------------------------------------------------------------------

    /// Load-time placement. Same checks as [`World::move_entity`].
    pub fn place(&mut self, id: &EntityId, location: &EntityId) -> CoreResult<()> {
        self.move_entity(id, Some(location))
    }

    /// Detach `id` from its current holder and attach it to `to`, or to
    /// nowhere when `to` is `None`.
    ///
    /// A move that would make an entity contain itself is rejected and the
    /// world is left exactly as it was.
    pub fn move_entity(&mut self, id: &EntityId, to: Option<&EntityId>) -> CoreResult<()> {
        if !self.contains(id) {
            return Err(CoreError::EntityNotFound(id.clone()));
        }
        if let Some(target) = to {
            if !self.contains(target) {
                return Err(CoreError::EntityNotFound(target.clone()));
            }
            if target == id || self.is_within(target, id) {
                warn!(entity = %id, target = %target, "rejected cyclic move");
                return Err(CoreError::ContainmentCycle {
                    entity: id.clone(),
                    target: target.clone(),
                });
            }
        }

        let old = self.entities.get_mut(id).and_then(|e| e.location.take());
        if let Some(parent) = old.as_ref().and_then(|p| self.entities.get_mut(p)) {
            parent.contents.remove(id);
        }
        if let Some(target) = to {
            if let Some(parent) = self.entities.get_mut(target) {
                parent.contents.insert(id.clone());
            }
            if let Some(entity) = self.entities.get_mut(id) {
                entity.location = Some(target.clone());
            }
        }
        debug!(entity = %id, to = ?to.map(EntityId::as_str), "moved");
        Ok(())
    }

    /// Whether `inner` is inside `outer`, directly or transitively.
    /// An entity is not within itself.
    pub fn is_within(&self, inner: &EntityId, outer: &EntityId) -> bool {
        let mut current = self.get(inner).and_then(Entity::location);
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == outer {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                return false;
            }
            current = self.get(parent).and_then(Entity::location);
        }
        false
    }

    /// The location an entity ultimately sits in. A location is its own holder.
    pub fn holder_room(&self, id: &EntityId) -> Option<&EntityId> {
        let mut current = self.get(id)?;
        let mut steps = 0;
        loop {
            if current.kind == EntityKind::Location {
                return Some(&current.id);
            }
            steps += 1;
            if steps > self.entities.len() {
                return None;
            }
            current = self.get(current.location()?)?;
        }
    }

    // -----------------------------------------------------------------------
    // Flags and properties
    // -----------------------------------------------------------------------

    /// Check a flag. Missing entities have no flags.
    pub fn flag(&self, id: &EntityId, flag: Flag) -> bool {
        self.get(id).is_some_and(|e| e.has_flag(flag))
    }

    /// Set a flag. Returns `true` if it was not set before.
    pub fn set_flag(&mut self, id: &EntityId, flag: Flag) -> CoreResult<bool> {
        Ok(self.entity_mut(id)?.set_flag(flag))
    }

    /// Clear a flag. Returns `true` if it was set before.
    pub fn clear_flag(&mut self, id: &EntityId, flag: Flag) -> CoreResult<bool> {
        Ok(self.entity_mut(id)?.clear_flag(flag))
    }

    /// Look up a property. An absent key is a typed error.
    pub fn property(&self, id: &EntityId, key: &str) -> CoreResult<&PropertyValue> {
        self.entity(id)?
            .property(key)
            .ok_or_else(|| CoreError::PropertyNotFound {
                entity: id.clone(),
                key: key.to_string(),
            })
    }

    /// Set a property, returning the previous value.
    pub fn set_property(
        &mut self,
        id: &EntityId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> CoreResult<Option<PropertyValue>> {
        Ok(self
            .entity_mut(id)?
            .properties
            .insert(key.into(), value.into()))
    }

    /// Remove a property, returning its value.
    pub fn remove_property(&mut self, id: &EntityId, key: &str) -> CoreResult<Option<PropertyValue>> {
        Ok(self.entity_mut(id)?.properties.remove(key))
    }

    // -----------------------------------------------------------------------
    // Connectivity
    // -----------------------------------------------------------------------

    /// Where the exit in `direction` from `location` leads.
    pub fn find_exit(&self, location: &EntityId, direction: Direction) -> Option<&EntityId> {
        self.get(location)?
            .components
            .location
            .as_ref()?
            .exits
            .get(&direction)
    }

    /// All exits of a location in canonical direction order.
    pub fn exits(&self, location: &EntityId) -> Vec<(Direction, &EntityId)> {
        self.get(location)
            .and_then(|e| e.components.location.as_ref())
            .map(|loc| loc.exits.iter().map(|(d, to)| (*d, to)).collect())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    /// Everything `observer` can see inside `root`, flattened.
    ///
    /// Closed, non-transparent containers appear but hide what they hold.
    /// Other people's belongings stay hidden. `hidden` entities are skipped
    /// together with anything inside them.
    pub fn visible_contents(&self, root: &EntityId, observer: &EntityId) -> Vec<EntityId> {
        let mut seen = Vec::new();
        let Some(root) = self.get(root) else {
            return seen;
        };
        if !root.exposes_contents_to(observer) {
            return seen;
        }
        let mut stack: Vec<&EntityId> = root.contents().rev().collect();
        while let Some(id) = stack.pop() {
            let Some(entity) = self.get(id) else {
                continue;
            };
            if entity.has_flag(Flag::Hidden) {
                continue;
            }
            seen.push(id.clone());
            if entity.exposes_contents_to(observer) {
                stack.extend(entity.contents().rev());
            }
        }
        seen
    }

    /// The entities an actor's noun phrases may resolve against: everything
    /// visible in the actor's room, which includes the actor's own
    /// possessions.
    pub fn scope_for(&self, actor: &EntityId) -> BTreeSet<EntityId> {
        let mut scope: BTreeSet<EntityId> = match self.holder_room(actor) {
            Some(room) => self.visible_contents(room, actor).into_iter().collect(),
            None => BTreeSet::new(),
        };
        // An actor stuck inside a closed container still knows its pockets.
        scope.extend(self.visible_contents(actor, actor));
        scope
    }

    /// Entities directly inside `holder`, excluding hidden ones.
    pub fn visible_children(&self, holder: &EntityId) -> Vec<&Entity> {
        self.get(holder)
            .map(|h| {
                h.contents()
                    .filter_map(|id| self.get(id))
                    .filter(|e| !e.has_flag(Flag::Hidden))
                    .collect()
            })
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Get all entities of a specific kind, in insertion order.
    pub fn entities_by_kind(&self, kind: EntityKind) -> Vec<&Entity> {
        self.by_kind
            .get(&kind)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get all entities in ID order.
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Start building a query.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Total number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Count entities by kind.
    pub fn entity_counts_by_kind(&self) -> BTreeMap<EntityKind, usize> {
        self.by_kind
            .iter()
            .map(|(k, ids)| (*k, ids.len()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Structural checks run once after content is loaded.
    pub fn validate(&self) -> CoreResult<()> {
        let player = self.player_id()?;
        if self.holder_room(player).is_none() {
            return Err(CoreError::Validation(format!(
                "player \"{player}\" is not inside any location"
            )));
        }

        for entity in self.entities.values() {
            if let Some(parent) = entity.location() {
                let holds = self
                    .get(parent)
                    .is_some_and(|p| p.directly_contains(&entity.id));
                if !holds {
                    return Err(CoreError::Validation(format!(
                        "\"{}\" claims to be in \"{parent}\", which does not list it",
                        entity.id
                    )));
                }
            }
            for child in entity.contents() {
                let back = self.get(child).and_then(Entity::location);
                if back != Some(&entity.id) {
                    return Err(CoreError::Validation(format!(
                        "\"{}\" lists \"{child}\" but it is elsewhere",
                        entity.id
                    )));
                }
            }
            self.check_acyclic(&entity.id)?;

            if let Some(loc) = &entity.components.location {
                for (direction, to) in &loc.exits {
                    match self.get(to) {
                        Some(target) if target.kind == EntityKind::Location => {}
                        Some(_) => {
                            return Err(CoreError::InvalidExit {
                                from: entity.id.clone(),
                                direction: *direction,
                                to: to.clone(),
                            });
                        }
                        None => return Err(CoreError::EntityNotFound(to.clone())),
                    }
                }
            }

            if let Some(character) = &entity.components.character {
                let mut last = i64::MIN;
                for entry in &character.schedule {
                    if entry.at < last {
                        return Err(CoreError::Validation(format!(
                            "schedule of \"{}\" is not sorted by time",
                            entity.id
                        )));
                    }
                    last = entry.at;
                    if let Some(to) = &entry.location {
                        if !self.contains(to) {
                            return Err(CoreError::EntityNotFound(to.clone()));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_acyclic(&self, id: &EntityId) -> CoreResult<()> {
        let mut visited = BTreeSet::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !visited.insert(node) {
                return Err(CoreError::ContainmentCycle {
                    entity: id.clone(),
                    target: node.clone(),
                });
            }
            current = self.get(node).and_then(Entity::location);
        }
        Ok(())
    }

    pub(crate) fn entities_mut(&mut self) -> &mut BTreeMap<EntityId, Entity> {
        &mut self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::LocationComponent;

    fn room(id: &str) -> Entity {
        let mut e = Entity::new(id, EntityKind::Location, id);
        e.components.location = Some(LocationComponent::default());
        e
    }

    fn item(id: &str) -> Entity {
        Entity::new(id, EntityKind::Item, id).with_flag(Flag::Portable)
    }

    fn test_world() -> World {
        let mut world = World::new(WorldMeta::new("Test"));
        let mut hall = room("hall");
        hall.components.location = Some(LocationComponent::default().with_exit(Direction::North, "study"));
        world.add_entity(hall).unwrap();
        world.add_entity(room("study")).unwrap();
        world
            .add_entity(Entity::new("player", EntityKind::Player, "yourself"))
            .unwrap();
        world
            .add_entity(item("chest").with_flag(Flag::Container).with_flag(Flag::Openable))
            .unwrap();
        world.add_entity(item("coin")).unwrap();
        world.place(&"player".into(), &"hall".into()).unwrap();
        world.place(&"chest".into(), &"hall".into()).unwrap();
        world.place(&"coin".into(), &"chest".into()).unwrap();
        world
    }

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut world = test_world();
        let err = world.add_entity(item("coin")).unwrap_err();
        assert_eq!(err, CoreError::DuplicateId(id("coin")));
    }

    #[test]
    fn second_player_rejected() {
        let mut world = test_world();
        let err = world
            .add_entity(Entity::new("other", EntityKind::Player, "other"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn move_keeps_contents_inverse() {
        let mut world = test_world();
        world.move_entity(&id("coin"), Some(&id("player"))).unwrap();
        assert_eq!(world.get(&id("coin")).unwrap().location(), Some(&id("player")));
        assert!(world.get(&id("player")).unwrap().directly_contains(&id("coin")));
        assert!(!world.get(&id("chest")).unwrap().directly_contains(&id("coin")));
        world.validate().unwrap();
    }

    #[test]
    fn move_to_nowhere() {
        let mut world = test_world();
        world.move_entity(&id("coin"), None).unwrap();
        assert_eq!(world.get(&id("coin")).unwrap().location(), None);
        assert_eq!(world.holder_room(&id("coin")), None);
    }

    #[test]
    fn cyclic_move_rejected_without_change() {
        let mut world = test_world();
        let before = world.entity_states();
        let err = world.move_entity(&id("chest"), Some(&id("coin"))).unwrap_err();
        assert!(matches!(err, CoreError::ContainmentCycle { .. }));
        let err = world.move_entity(&id("chest"), Some(&id("chest"))).unwrap_err();
        assert!(matches!(err, CoreError::ContainmentCycle { .. }));
        assert_eq!(world.entity_states(), before);
    }

    #[test]
    fn move_of_missing_entity_is_an_error() {
        let mut world = test_world();
        assert_eq!(
            world.move_entity(&id("ghost"), Some(&id("hall"))),
            Err(CoreError::EntityNotFound(id("ghost")))
        );
        assert_eq!(
            world.move_entity(&id("coin"), Some(&id("void"))),
            Err(CoreError::EntityNotFound(id("void")))
        );
    }

    #[test]
    fn closed_container_hides_contents_until_opened() {
        let mut world = test_world();
        let scope = world.scope_for(&id("player"));
        assert!(scope.contains(&id("chest")));
        assert!(!scope.contains(&id("coin")));

        world.set_flag(&id("chest"), Flag::Open).unwrap();
        let scope = world.scope_for(&id("player"));
        assert!(scope.contains(&id("coin")));
    }

    #[test]
    fn hidden_entities_are_not_visible() {
        let mut world = test_world();
        world.set_flag(&id("chest"), Flag::Hidden).unwrap();
        world.set_flag(&id("chest"), Flag::Open).unwrap();
        let scope = world.scope_for(&id("player"));
        assert!(!scope.contains(&id("chest")));
        assert!(!scope.contains(&id("coin")));
    }

    #[test]
    fn inventory_is_in_scope() {
        let mut world = test_world();
        world.move_entity(&id("coin"), Some(&id("player"))).unwrap();
        assert!(world.scope_for(&id("player")).contains(&id("coin")));
        assert_eq!(world.holder_room(&id("coin")), Some(&id("hall")));
        assert!(world.is_within(&id("coin"), &id("hall")));
        assert!(!world.is_within(&id("hall"), &id("coin")));
    }

    #[test]
    fn other_peoples_pockets_are_out_of_scope() {
        let mut world = test_world();
        world
            .add_entity(Entity::new("butler", EntityKind::Character, "butler"))
            .unwrap();
        world.place(&id("butler"), &id("hall")).unwrap();
        world.move_entity(&id("coin"), Some(&id("butler"))).unwrap();
        let scope = world.scope_for(&id("player"));
        assert!(scope.contains(&id("butler")));
        assert!(!scope.contains(&id("coin")));
    }

    #[test]
    fn exits() {
        let world = test_world();
        assert_eq!(world.find_exit(&id("hall"), Direction::North), Some(&id("study")));
        assert_eq!(world.find_exit(&id("hall"), Direction::South), None);
        assert_eq!(world.exits(&id("hall")), vec![(Direction::North, &id("study"))]);
    }

    #[test]
    fn properties_have_typed_absence() {
        let mut world = test_world();
        assert_eq!(
            world.property(&id("coin"), "value"),
            Err(CoreError::PropertyNotFound {
                entity: id("coin"),
                key: "value".into()
            })
        );
        world.set_property(&id("coin"), "value", 5).unwrap();
        assert_eq!(world.property(&id("coin"), "value"), Ok(&PropertyValue::Integer(5)));
        assert_eq!(
            world.remove_property(&id("coin"), "value"),
            Ok(Some(PropertyValue::Integer(5)))
        );
    }

    #[test]
    fn validate_rejects_exit_to_item() {
        let mut world = test_world();
        world
            .get_mut(&id("study"))
            .unwrap()
            .components
            .location = Some(LocationComponent::default().with_exit(Direction::South, "coin"));
        assert!(matches!(world.validate(), Err(CoreError::InvalidExit { .. })));
    }

    #[test]
    fn validate_requires_placed_player() {
        let mut world = test_world();
        world.move_entity(&id("player"), None).unwrap();
        assert!(matches!(world.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn entities_by_kind() {
        let world = test_world();
        assert_eq!(world.entities_by_kind(EntityKind::Location).len(), 2);
        assert_eq!(world.entities_by_kind(EntityKind::Item).len(), 2);
        assert_eq!(world.entity_counts_by_kind()[&EntityKind::Player], 1);
    }

    mod containment_props {
        use super::*;
        use proptest::prelude::*;

        const IDS: [&str; 6] = ["hall", "study", "player", "chest", "coin", "box"];

        fn forest() -> World {
            let mut world = test_world();
            world
                .add_entity(item("box").with_flag(Flag::Container).with_flag(Flag::Open))
                .unwrap();
            world
        }

        fn invariant_holds(world: &World) -> bool {
            world.all_entities().all(|e| {
                let up = e
                    .location()
                    .is_none_or(|p| world.get(p).is_some_and(|p| p.directly_contains(&e.id)));
                let down = e
                    .contents()
                    .all(|c| world.get(c).and_then(Entity::location) == Some(&e.id));
                up && down && !world.is_within(&e.id, &e.id)
            })
        }

        proptest! {
            #[test]
            fn random_moves_keep_forest(moves in prop::collection::vec((0..6usize, prop::option::of(0..6usize)), 0..40)) {
                let mut world = forest();
                for (who, to) in moves {
                    let who = id(IDS[who]);
                    let to = to.map(|t| id(IDS[t]));
                    let before = world.entity_states();
                    let cyclic = to.as_ref().is_some_and(|t| *t == who || world.is_within(t, &who));
                    let result = world.move_entity(&who, to.as_ref());
                    if cyclic {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(world.entity_states(), before);
                    } else {
                        prop_assert!(result.is_ok());
                    }
                    prop_assert!(invariant_holds(&world));
                }
            }
        }
    }
}
