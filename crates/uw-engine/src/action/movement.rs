use tracing::debug;
use uw_core::{EntityId, Flag};
use uw_parser::Command;

use super::{ActionContext, ActionHandler, Outcome};
use crate::describe::describe_room;
use crate::error::{EngineResult, Refusal};

/// `go DIR`. Darkness does not stop anyone walking.
#[derive(Debug, Clone, Copy)]
pub struct Go;

fn destination(cmd: &Command, ctx: &ActionContext<'_>) -> Result<EntityId, Refusal> {
    let Some(direction) = cmd.direction else {
        return Err(Refusal::new("Which way do you want to go?"));
    };
    ctx.world
        .holder_room(&ctx.actor)
        .and_then(|room| ctx.world.find_exit(room, direction))
        .cloned()
        .ok_or_else(|| Refusal::new("You can't go that way."))
}

impl ActionHandler for Go {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        destination(cmd, ctx).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let to = match destination(cmd, ctx) {
            Ok(to) => to,
            Err(refusal) => return Ok(Outcome::refused(refusal)),
        };
        let actor = ctx.actor.clone();
        ctx.world.move_entity(&actor, Some(&to))?;
        ctx.world.set_flag(&to, Flag::Visited)?;
        debug!(actor = %actor, to = %to, "moved");
        Ok(Outcome::lines(describe_room(ctx.world, &actor)).taking(ctx.action_minutes()))
    }
}
