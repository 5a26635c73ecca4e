use uw_core::{EntityId, Flag};
use uw_parser::Command;

use super::{ActionContext, ActionHandler, Outcome, direct, target, the};
use crate::describe::{contents_line, describe_room, join_list};
use crate::error::{EngineResult, Refusal};

/// `look`: the room description. Free.
#[derive(Debug, Clone, Copy)]
pub struct Look;

impl ActionHandler for Look {
    fn execute(&self, _cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        Ok(Outcome::lines(describe_room(ctx.world, &ctx.actor)))
    }
}

/// `examine`: the long description, plus what an open container holds.
#[derive(Debug, Clone, Copy)]
pub struct Examine;

impl ActionHandler for Examine {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        target(ctx.world, cmd.direct.as_ref()).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let entity = ctx.entity(direct(cmd)?)?;
        let mut lines = vec![if entity.description.is_empty() {
            format!("You see nothing special about {}.", entity.definite_name())
        } else {
            entity.description.clone()
        }];
        if entity.kind.is_person() && entity.id != ctx.actor {
            if let Some(activity) = entity.text_property("activity") {
                lines.push(format!("{} is {activity}.", the(entity)));
            }
        }
        if let Some(line) = contents_line(ctx.world, entity, &ctx.actor) {
            lines.push(line);
        }
        Ok(Outcome::lines(lines))
    }
}

/// `read`: the `text` property, falling back to the description.
#[derive(Debug, Clone, Copy)]
pub struct Read;

impl ActionHandler for Read {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let entity = target(ctx.world, cmd.direct.as_ref())?;
        if entity.has_flag(Flag::Readable) {
            Ok(())
        } else {
            Err(Refusal::new(format!(
                "There's nothing written on {}.",
                entity.definite_name()
            )))
        }
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let entity = ctx.entity(direct(cmd)?)?;
        let text = entity
            .text_property("text")
            .unwrap_or(&entity.description)
            .to_string();
        Ok(Outcome::say(text))
    }
}

/// `search [OBJ]`: uncovers hidden things in the object, or in the room.
#[derive(Debug, Clone, Copy)]
pub struct Search;

impl ActionHandler for Search {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let Some(id) = cmd.direct.as_ref() else {
            return Ok(());
        };
        let entity = target(ctx.world, Some(id))?;
        if entity.kind.is_person() && entity.id != ctx.actor {
            return Err(Refusal::new(format!(
                "{} wouldn't appreciate being searched.",
                the(entity)
            )));
        }
        if entity.is_closed_container() {
            return Err(Refusal::new(format!("{} is closed.", the(entity))));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let place = match cmd.direct.as_ref() {
            Some(id) => id.clone(),
            None => match ctx.world.holder_room(&ctx.actor) {
                Some(room) => room.clone(),
                None => return Ok(Outcome::say("There's nothing here to search.")),
            },
        };

        let hidden: Vec<EntityId> = ctx
            .entity(&place)?
            .contents()
            .filter(|id| ctx.world.flag(id, Flag::Hidden))
            .cloned()
            .collect();
        let mut found = Vec::new();
        for id in &hidden {
            ctx.world.clear_flag(id, Flag::Hidden)?;
            found.push(ctx.entity(id)?.indefinite_name());
        }
        ctx.world.set_flag(&place, Flag::Searched)?;

        let line = if found.is_empty() {
            "You find nothing of interest.".to_string()
        } else {
            format!("You find {}.", join_list(&found, "and"))
        };
        Ok(Outcome::say(line).taking(ctx.action_minutes()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::ActionDispatcher;
    use super::super::testing::{cmd, ctx, world};
    use super::*;
    use crate::config::EngineConfig;
    use uw_core::World;

    fn run(world: &mut World, command: Command) -> Outcome {
        let config = EngineConfig::default();
        ActionDispatcher::standard()
            .dispatch(&command, &mut ctx(world, &config))
            .unwrap()
    }

    #[test]
    fn examine_is_the_long_description_and_free() {
        let mut world = world();
        let out = run(&mut world, cmd("examine").with_direct("note"));
        assert_eq!(out.narrative, ["A hastily scrawled note."]);
        assert_eq!(out.minutes, 0);

        let out = run(&mut world, cmd("examine").with_direct("lamp"));
        assert_eq!(out.narrative, ["You see nothing special about the oil lamp."]);
    }

    #[test]
    fn examine_lists_open_container_contents() {
        let mut world = world();
        let out = run(&mut world, cmd("examine").with_direct("box"));
        assert_eq!(out.narrative.len(), 1);
        world.set_flag(&"box".into(), Flag::Open).unwrap();
        let out = run(&mut world, cmd("examine").with_direct("box"));
        assert_eq!(out.narrative[1], "The wooden box contains a gold ring.");
    }

    #[test]
    fn read_uses_text_property() {
        let mut world = world();
        let out = run(&mut world, cmd("read").with_direct("note"));
        assert_eq!(out.narrative, ["Meet me at midnight."]);
        let out = run(&mut world, cmd("read").with_direct("lamp"));
        assert_eq!(out.narrative, ["There's nothing written on the oil lamp."]);
    }

    #[test]
    fn search_reveals_hidden_things() {
        let mut world = world();
        world.set_flag(&"key".into(), Flag::Hidden).unwrap();
        world.move_entity(&"key".into(), Some(&"table".into())).unwrap();

        let out = run(&mut world, cmd("search").with_direct("table"));
        assert_eq!(out.narrative, ["You find a small key."]);
        assert_eq!(out.minutes, 1);
        assert!(!world.flag(&"key".into(), Flag::Hidden));
        assert!(world.flag(&"table".into(), Flag::Searched));

        let out = run(&mut world, cmd("search"));
        assert_eq!(out.narrative, ["You find nothing of interest."]);
    }

    #[test]
    fn look_describes_the_room() {
        let mut world = world();
        let out = run(&mut world, cmd("look"));
        assert_eq!(out.narrative[0], "Hall");
        assert_eq!(out.narrative[1], "A draughty hall.");
        assert!(out.narrative.contains(&"Hobbs is here.".to_string()));
        assert_eq!(out.minutes, 0);
    }
}
