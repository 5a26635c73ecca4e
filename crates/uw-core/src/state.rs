use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Flag, PropertyValue};
use crate::error::{CoreError, CoreResult};
use crate::world::World;

/// The mutable part of an entity: everything a saved game must remember.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Direct holder.
    pub location: Option<EntityId>,
    /// Flags currently set.
    pub flags: BTreeSet<Flag>,
    /// Current properties.
    pub properties: BTreeMap<String, PropertyValue>,
}

impl World {
    /// Capture the mutable state of every entity.
    pub fn entity_states(&self) -> BTreeMap<EntityId, EntityState> {
        self.all_entities()
            .map(|e| {
                (
                    e.id.clone(),
                    EntityState {
                        location: e.location().cloned(),
                        flags: e.flags.clone(),
                        properties: e.properties.clone(),
                    },
                )
            })
            .collect()
    }

    /// Overwrite entity state from a capture.
    ///
    /// Entities missing from `states` keep their current state. The whole
    /// capture is checked first: unknown IDs, unknown holders and
    /// containment cycles are rejected and nothing changes.
    pub fn apply_states(&mut self, states: &BTreeMap<EntityId, EntityState>) -> CoreResult<()> {
        let mut parents: BTreeMap<&EntityId, Option<&EntityId>> = self
            .all_entities()
            .map(|e| (&e.id, e.location()))
            .collect();
        for (id, state) in states {
            if !self.contains(id) {
                return Err(CoreError::EntityNotFound(id.clone()));
            }
            if let Some(holder) = &state.location {
                if !self.contains(holder) {
                    return Err(CoreError::EntityNotFound(holder.clone()));
                }
            }
            parents.insert(id, state.location.as_ref());
        }

        let limit = parents.len();
        for start in parents.keys() {
            let mut current = parents.get(start).copied().flatten();
            let mut steps = 0;
            while let Some(node) = current {
                if node == *start || steps > limit {
                    return Err(CoreError::ContainmentCycle {
                        entity: (*start).clone(),
                        target: node.clone(),
                    });
                }
                steps += 1;
                current = parents.get(node).copied().flatten();
            }
        }

        let moves: Vec<(EntityId, Option<EntityId>)> = parents
            .into_iter()
            .map(|(id, parent)| (id.clone(), parent.cloned()))
            .collect();
        let entities = self.entities_mut();
        for entity in entities.values_mut() {
            entity.contents.clear();
        }
        for (id, parent) in moves {
            if let Some(parent_id) = &parent {
                if let Some(holder) = entities.get_mut(parent_id) {
                    holder.contents.insert(id.clone());
                }
            }
            if let Some(entity) = entities.get_mut(&id) {
                entity.location = parent;
                if let Some(state) = states.get(&id) {
                    entity.flags = state.flags.clone();
                    entity.properties = state.properties.clone();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind};
    use crate::world::WorldMeta;

    fn test_world() -> World {
        let mut world = World::new(WorldMeta::new("State"));
        world
            .add_entity(Entity::new("hall", EntityKind::Location, "Hall"))
            .unwrap();
        world
            .add_entity(Entity::new("garden", EntityKind::Location, "Garden"))
            .unwrap();
        world
            .add_entity(Entity::new("box", EntityKind::Item, "box").with_flag(Flag::Container))
            .unwrap();
        world
            .add_entity(Entity::new("ring", EntityKind::Item, "ring"))
            .unwrap();
        world.place(&"box".into(), &"hall".into()).unwrap();
        world.place(&"ring".into(), &"box".into()).unwrap();
        world
    }

    #[test]
    fn capture_and_apply_restores_state() {
        let mut world = test_world();
        let saved = world.entity_states();

        world.move_entity(&"ring".into(), Some(&"garden".into())).unwrap();
        world.set_flag(&"box".into(), Flag::Open).unwrap();
        world.set_property(&"ring".into(), "polished", true).unwrap();
        assert_ne!(world.entity_states(), saved);

        world.apply_states(&saved).unwrap();
        assert_eq!(world.entity_states(), saved);
        assert!(world.get(&"box".into()).unwrap().directly_contains(&"ring".into()));
        assert!(!world.get(&"garden".into()).unwrap().directly_contains(&"ring".into()));
    }

    #[test]
    fn cyclic_capture_is_rejected_untouched() {
        let mut world = test_world();
        let before = world.entity_states();
        let mut bad = before.clone();
        if let Some(state) = bad.get_mut(&EntityId::new("box")) {
            state.location = Some("ring".into());
        }
        assert!(matches!(
            world.apply_states(&bad),
            Err(CoreError::ContainmentCycle { .. })
        ));
        assert_eq!(world.entity_states(), before);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut world = test_world();
        let mut bad = world.entity_states();
        bad.insert(
            "ghost".into(),
            EntityState {
                location: None,
                flags: BTreeSet::new(),
                properties: BTreeMap::new(),
            },
        );
        assert_eq!(
            world.apply_states(&bad),
            Err(CoreError::EntityNotFound("ghost".into()))
        );
    }
}
