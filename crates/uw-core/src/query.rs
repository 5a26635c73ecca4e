use crate::entity::{Entity, EntityId, EntityKind, Flag};
use crate::world::World;

/// A builder for filtering entities in a world.
pub struct QueryBuilder<'w> {
    world: &'w World,
    kind_filter: Option<EntityKind>,
    flag_filters: Vec<Flag>,
    without_flags: Vec<Flag>,
    within: Option<EntityId>,
    has_property: Option<String>,
    limit: Option<usize>,
}

impl<'w> QueryBuilder<'w> {
    /// Start an unfiltered query.
    pub fn new(world: &'w World) -> Self {
        Self {
            world,
            kind_filter: None,
            flag_filters: Vec::new(),
            without_flags: Vec::new(),
            within: None,
            has_property: None,
            limit: None,
        }
    }

    /// Filter by entity kind.
    pub fn kind(mut self, kind: EntityKind) -> Self {
        self.kind_filter = Some(kind);
        self
    }

    /// Keep entities carrying this flag. Repeat to require several.
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flag_filters.push(flag);
        self
    }

    /// Drop entities carrying this flag.
    pub fn without_flag(mut self, flag: Flag) -> Self {
        self.without_flags.push(flag);
        self
    }

    /// Keep entities inside `holder`, at any depth.
    pub fn within(mut self, holder: impl Into<EntityId>) -> Self {
        self.within = Some(holder.into());
        self
    }

    /// Filter to entities that have a specific property key.
    pub fn has_property(mut self, key: impl Into<String>) -> Self {
        self.has_property = Some(key.into());
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Execute the query. Results come back in ID order.
    pub fn execute(self) -> Vec<&'w Entity> {
        let results = self.world.all_entities().filter(|e| self.matches(e));
        match self.limit {
            Some(limit) => results.take(limit).collect(),
            None => results.collect(),
        }
    }

    /// Count matching entities without collecting them.
    pub fn count(self) -> usize {
        self.world
            .all_entities()
            .filter(|e| self.matches(e))
            .count()
    }

    fn matches(&self, entity: &Entity) -> bool {
        if let Some(kind) = self.kind_filter {
            if entity.kind != kind {
                return false;
            }
        }
        if !self.flag_filters.iter().all(|f| entity.has_flag(*f)) {
            return false;
        }
        if self.without_flags.iter().any(|f| entity.has_flag(*f)) {
            return false;
        }
        if let Some(holder) = &self.within {
            if !self.world.is_within(&entity.id, holder) {
                return false;
            }
        }
        if let Some(key) = &self.has_property {
            if entity.property(key).is_none() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldMeta;

    fn test_world() -> World {
        let mut world = World::new(WorldMeta::new("Query"));
        world
            .add_entity(Entity::new("library", EntityKind::Location, "Library"))
            .unwrap();
        world
            .add_entity(
                Entity::new("letter", EntityKind::Item, "letter")
                    .with_flag(Flag::Evidence)
                    .with_property("evidence_value", 20),
            )
            .unwrap();
        world
            .add_entity(
                Entity::new("desk", EntityKind::Item, "desk")
                    .with_flag(Flag::Container)
                    .with_flag(Flag::Open),
            )
            .unwrap();
        world
            .add_entity(Entity::new("cup", EntityKind::Item, "cup").with_flag(Flag::Portable))
            .unwrap();
        world.place(&"desk".into(), &"library".into()).unwrap();
        world.place(&"letter".into(), &"desk".into()).unwrap();
        world
    }

    fn ids(entities: Vec<&Entity>) -> Vec<&str> {
        entities.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn filter_by_kind() {
        let world = test_world();
        assert_eq!(ids(world.query().kind(EntityKind::Item).execute()), ["cup", "desk", "letter"]);
    }

    #[test]
    fn filter_by_flag_and_property() {
        let world = test_world();
        assert_eq!(ids(world.query().flag(Flag::Evidence).execute()), ["letter"]);
        assert_eq!(ids(world.query().has_property("evidence_value").execute()), ["letter"]);
        assert_eq!(
            world.query().kind(EntityKind::Item).without_flag(Flag::Container).count(),
            2
        );
    }

    #[test]
    fn filter_within_is_transitive() {
        let world = test_world();
        assert_eq!(ids(world.query().within("library").execute()), ["desk", "letter"]);
        assert_eq!(ids(world.query().within("desk").execute()), ["letter"]);
    }

    #[test]
    fn limit() {
        let world = test_world();
        assert_eq!(world.query().limit(2).execute().len(), 2);
    }
}
