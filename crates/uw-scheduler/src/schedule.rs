//! NPC schedule following.
//!
//! Each character with a schedule gets one `follow_schedule` daemon. On every
//! tick the daemon looks up the entry current at the clock and, when it is not
//! the one last executed, moves the character and records the new entry in the
//! character's `schedule_entry` property.

use tracing::debug;
use uw_core::{EntityId, EntityKind, Flag, PropertyValue, World};

use crate::context::EventContext;
use crate::error::SchedResult;
use crate::event::EventAction;
use crate::handler::EventHandler;
use crate::scheduler::Scheduler;

/// Property holding the index of the last executed schedule entry.
pub const ENTRY_PROPERTY: &str = "schedule_entry";

/// Property holding the character's current activity text.
pub const ACTIVITY_PROPERTY: &str = "activity";

/// Daemon handler that keeps one character on their schedule.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleFollower;

impl ScheduleFollower {
    /// Handler name.
    pub const NAME: &'static str = "follow_schedule";

    /// The daemon action for `character`.
    pub fn action(character: &EntityId) -> EventAction {
        EventAction::new(Self::NAME).with_arg("character", character.as_str())
    }
}

impl EventHandler for ScheduleFollower {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let character = action.reader().entity("character")?;
        let now = ctx.now();
        for line in follow(ctx.world, &character, now)? {
            ctx.say(line);
        }
        Ok(())
    }
}

/// Register a follower daemon for every character with a schedule and put
/// each of them where their schedule says they are at the scheduler's
/// current time. Returns how many daemons were added.
pub fn install_schedules(scheduler: &mut Scheduler, world: &mut World) -> SchedResult<usize> {
    let characters: Vec<EntityId> = world
        .entities_by_kind(EntityKind::Character)
        .into_iter()
        .filter(|e| {
            e.components
                .character
                .as_ref()
                .is_some_and(|c| !c.schedule.is_empty())
        })
        .map(|e| e.id.clone())
        .collect();

    let now = scheduler.now();
    for character in &characters {
        follow(world, character, now)?;
        scheduler.schedule_recurring(ScheduleFollower::action(character))?;
    }
    Ok(characters.len())
}

/// Apply the entry current at `now` to `character`. Returns the narrative
/// the player witnesses.
fn follow(world: &mut World, character: &EntityId, now: i64) -> SchedResult<Vec<String>> {
    let entity = world.entity(character)?;
    if entity.has_flag(Flag::Detained) {
        return Ok(Vec::new());
    }
    let Some(component) = entity.components.character.as_ref() else {
        return Ok(Vec::new());
    };
    let Some(index) = component.entry_at(now) else {
        return Ok(Vec::new());
    };
    let last = entity.property(ENTRY_PROPERTY).and_then(PropertyValue::as_i64);
    if last == Some(index as i64) {
        return Ok(Vec::new());
    }

    let entry = component.schedule[index].clone();
    let from = entity.location().cloned();
    let name = capitalize(&entity.definite_name());
    let player_room = world
        .player()
        .and_then(|p| world.holder_room(p))
        .cloned();

    let mut narrative = Vec::new();
    let mut witnessed = player_room.is_some() && player_room == from;

    match entry.location.as_ref() {
        Some(to) if from.as_ref() != Some(to) => {
            world.move_entity(character, Some(to))?;
            debug!(character = %character, to = %to, at = now, "schedule move");
            if witnessed {
                narrative.push(format!("{name} leaves."));
            }
            if player_room.as_ref() == Some(to) {
                narrative.push(format!("{name} arrives."));
                witnessed = true;
            }
        }
        _ => {}
    }

    if witnessed {
        if let Some(announce) = entry.announce {
            narrative.push(announce);
        }
    }

    match entry.activity {
        Some(activity) => {
            world.set_property(character, ACTIVITY_PROPERTY, activity)?;
        }
        None => {
            world.remove_property(character, ACTIVITY_PROPERTY)?;
        }
    }
    world.set_property(character, ENTRY_PROPERTY, index as i64)?;
    Ok(narrative)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uw_core::{CharacterComponent, Entity, ScheduleEntry, WorldMeta};

    fn entry(at: i64, location: &str) -> ScheduleEntry {
        ScheduleEntry {
            at,
            location: Some(location.into()),
            activity: None,
            announce: None,
        }
    }

    fn world() -> World {
        let mut world = World::new(WorldMeta::new("Schedules"));
        for (id, name) in [("hall", "Hall"), ("kitchen", "Kitchen"), ("study", "Study")] {
            world
                .add_entity(Entity::new(id, EntityKind::Location, name))
                .unwrap();
        }
        world
            .add_entity(Entity::new("player", EntityKind::Player, "yourself"))
            .unwrap();
        let mut butler = Entity::new("butler", EntityKind::Character, "Hobbs");
        butler.components.character = Some(CharacterComponent {
            schedule: vec![
                entry(480, "kitchen"),
                ScheduleEntry {
                    announce: Some("He is carrying a tray.".into()),
                    activity: Some("polishing the silver".into()),
                    ..entry(540, "hall")
                },
                entry(600, "study"),
            ],
            ..CharacterComponent::default()
        });
        world.add_entity(butler).unwrap();
        world.place(&"player".into(), &"hall".into()).unwrap();
        world.place(&"butler".into(), &"kitchen".into()).unwrap();
        world
    }

    fn location(world: &World) -> Option<EntityId> {
        world.get(&"butler".into()).unwrap().location().cloned()
    }

    #[test]
    fn witnessed_arrival_and_departure() {
        let mut world = world();
        let butler = EntityId::new("butler");
        assert!(follow(&mut world, &butler, 480).unwrap().is_empty());

        let lines = follow(&mut world, &butler, 545).unwrap();
        assert_eq!(lines, ["Hobbs arrives.", "He is carrying a tray."]);
        assert_eq!(location(&world), Some("hall".into()));
        assert_eq!(
            world.property(&butler, ACTIVITY_PROPERTY).unwrap().as_str(),
            Some("polishing the silver")
        );

        assert!(follow(&mut world, &butler, 550).unwrap().is_empty());

        let lines = follow(&mut world, &butler, 600).unwrap();
        assert_eq!(lines, ["Hobbs leaves."]);
        assert!(world.property(&butler, ACTIVITY_PROPERTY).is_err());
    }

    #[test]
    fn detained_characters_catch_up_later() {
        let mut world = world();
        let butler = EntityId::new("butler");
        world.set_flag(&butler, Flag::Detained).unwrap();
        follow(&mut world, &butler, 610).unwrap();
        assert_eq!(location(&world), Some("kitchen".into()));

        world.clear_flag(&butler, Flag::Detained).unwrap();
        follow(&mut world, &butler, 615).unwrap();
        assert_eq!(location(&world), Some("study".into()));
        assert_eq!(
            world.property(&butler, ENTRY_PROPERTY).unwrap().as_i64(),
            Some(2)
        );
    }

    #[test]
    fn install_registers_one_daemon_per_scheduled_character() {
        let mut world = world();
        let mut scheduler = Scheduler::new(480);
        assert_eq!(install_schedules(&mut scheduler, &mut world).unwrap(), 1);
        assert_eq!(scheduler.daemons().len(), 1);
        assert_eq!(
            world.property(&"butler".into(), ENTRY_PROPERTY).unwrap().as_i64(),
            Some(0)
        );
    }
}
