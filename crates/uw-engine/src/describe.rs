//! Text generation for rooms, containers and lists.

use uw_core::{Entity, EntityId, EntityKind, Flag, World};

/// Shown instead of a room description when there is no light.
pub const DARKNESS: &str = "It is pitch dark. You can't see a thing.";

/// Whether `actor` has light: their room is lit, or something lit is in
/// their scope.
pub fn is_lit(world: &World, actor: &EntityId) -> bool {
    let Some(room) = world.holder_room(actor) else {
        return false;
    };
    world.flag(room, Flag::Lit)
        || world
            .scope_for(actor)
            .iter()
            .any(|id| world.flag(id, Flag::Lit))
}

/// The full description of the actor's surroundings.
pub fn describe_room(world: &World, actor: &EntityId) -> Vec<String> {
    if !is_lit(world, actor) {
        return vec![DARKNESS.to_string()];
    }
    let Some(room) = world.holder_room(actor).and_then(|id| world.get(id)) else {
        return vec![DARKNESS.to_string()];
    };

    let mut lines = vec![room.name.clone()];
    if !room.description.is_empty() {
        lines.push(room.description.clone());
    }

    let children = world.visible_children(&room.id);
    let mut listed = Vec::new();
    for child in &children {
        if child.id == *actor {
            continue;
        }
        match child.kind {
            EntityKind::Character | EntityKind::Player => lines.push(person_line(child)),
            _ => {
                if let Some(short) = &child.short_description {
                    lines.push(short.clone());
                } else if !child.has_flag(Flag::Fixed) {
                    listed.push(child.indefinite_name());
                }
            }
        }
    }
    if !listed.is_empty() {
        lines.push(format!("You can see {} here.", join_list(&listed, "and")));
    }
    for child in &children {
        if child.id != *actor && !child.kind.is_person() {
            if let Some(line) = contents_line(world, child, actor) {
                lines.push(line);
            }
        }
    }

    let exits: Vec<String> = world
        .exits(&room.id)
        .into_iter()
        .map(|(direction, _)| direction.name().to_string())
        .collect();
    if !exits.is_empty() {
        lines.push(format!("Exits: {}.", join_list(&exits, "and")));
    }
    lines
}

fn person_line(person: &Entity) -> String {
    let name = capitalize(&person.definite_name());
    match person.text_property("activity") {
        Some(activity) => format!("{name} is here, {activity}."),
        None => format!("{name} is here."),
    }
}

/// "The box contains a ring." for open containers and surfaces with
/// something visible on or in them.
pub fn contents_line(world: &World, holder: &Entity, observer: &EntityId) -> Option<String> {
    if !(holder.has_flag(Flag::Container) || holder.has_flag(Flag::Surface)) {
        return None;
    }
    if !holder.exposes_contents_to(observer) {
        return None;
    }
    let names: Vec<String> = world
        .visible_children(&holder.id)
        .into_iter()
        .map(Entity::indefinite_name)
        .collect();
    if names.is_empty() {
        return None;
    }
    let list = join_list(&names, "and");
    if holder.has_flag(Flag::Surface) {
        Some(format!("On {} you see {list}.", holder.definite_name()))
    } else {
        Some(format!("{} contains {list}.", capitalize(&holder.definite_name())))
    }
}

/// What the actor carries, one line per item.
pub fn inventory_lines(world: &World, actor: &EntityId) -> Vec<String> {
    let held = world.visible_children(actor);
    if held.is_empty() {
        return vec!["You are empty-handed.".to_string()];
    }
    let mut lines = vec!["You are carrying:".to_string()];
    for item in held {
        lines.push(format!("  {}", item.indefinite_name()));
        for inner in world.visible_children(&item.id) {
            if item.exposes_contents_to(actor) {
                lines.push(format!("    {}", inner.indefinite_name()));
            }
        }
    }
    lines
}

/// Join names as "a", "a and b" or "a, b, and c".
pub fn join_list(items: &[String], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [a, b] => format!("{a} {conjunction} {b}"),
        [init @ .., last] => format!("{}, {conjunction} {last}", init.join(", ")),
    }
}

/// Uppercase the first letter.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uw_core::{Direction, LocationComponent, WorldMeta};

    fn world() -> World {
        let mut world = World::new(WorldMeta::new("Describe"));
        let mut study = Entity::new("study", EntityKind::Location, "Study")
            .with_description("Books line every wall.")
            .with_flag(Flag::Lit);
        study.components.location = Some(LocationComponent::default().with_exit(Direction::North, "hall"));
        world.add_entity(study).unwrap();
        world
            .add_entity(Entity::new("hall", EntityKind::Location, "Hall").with_flag(Flag::Lit))
            .unwrap();
        world
            .add_entity(Entity::new("me", EntityKind::Player, "yourself"))
            .unwrap();
        world
            .add_entity(
                Entity::new("desk", EntityKind::Item, "desk")
                    .with_flag(Flag::Fixed)
                    .with_flag(Flag::Surface),
            )
            .unwrap();
        world
            .add_entity(Entity::new("pen", EntityKind::Item, "pen").with_flag(Flag::Portable))
            .unwrap();
        world
            .add_entity(Entity::new("apple", EntityKind::Item, "apple").with_flag(Flag::Portable))
            .unwrap();
        world
            .add_entity(
                Entity::new("maid", EntityKind::Character, "Ada")
                    .with_property("activity", "dusting the shelves"),
            )
            .unwrap();
        for (id, at) in [("me", "study"), ("desk", "study"), ("apple", "study"), ("maid", "study"), ("pen", "desk")] {
            world.place(&id.into(), &at.into()).unwrap();
        }
        world
    }

    #[test]
    fn room_description_lists_everything() {
        let world = world();
        let lines = describe_room(&world, &"me".into());
        assert_eq!(
            lines,
            [
                "Study",
                "Books line every wall.",
                "Ada is here, dusting the shelves.",
                "You can see an apple here.",
                "On the desk you see a pen.",
                "Exits: north.",
            ]
        );
    }

    #[test]
    fn darkness_hides_the_room() {
        let mut world = world();
        world.clear_flag(&"study".into(), Flag::Lit).unwrap();
        assert_eq!(describe_room(&world, &"me".into()), [DARKNESS]);

        world.set_flag(&"apple".into(), Flag::Lit).unwrap();
        assert!(is_lit(&world, &"me".into()));
    }

    #[test]
    fn lists_read_naturally() {
        let items = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_list(&items(&["a"]), "and"), "a");
        assert_eq!(join_list(&items(&["a", "b"]), "or"), "a or b");
        assert_eq!(join_list(&items(&["a", "b", "c"]), "and"), "a, b, and c");
        assert_eq!(capitalize("the lamp"), "The lamp");
    }

    #[test]
    fn inventory_shows_nested_items() {
        let mut world = world();
        assert_eq!(inventory_lines(&world, &"me".into()), ["You are empty-handed."]);
        world.move_entity(&"apple".into(), Some(&"me".into())).unwrap();
        assert_eq!(
            inventory_lines(&world, &"me".into()),
            ["You are carrying:", "  an apple"]
        );
    }
}
