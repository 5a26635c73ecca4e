//! Built-in event handlers.

use uw_core::{EntityId, Flag};

use crate::context::EventContext;
use crate::error::SchedResult;
use crate::event::EventAction;
use crate::handler::EventHandler;

/// Prints `text`. With a `location` argument, only when the player is there.
#[derive(Debug, Clone, Copy)]
pub struct Message;

impl EventHandler for Message {
    fn name(&self) -> &str {
        "message"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let args = action.reader();
        let text = args.str("text")?;
        if let Some(location) = args.opt_entity("location")? {
            if ctx.player_room().as_ref() != Some(&location) {
                return Ok(());
            }
        }
        ctx.say(text);
        Ok(())
    }
}

/// Moves `entity` into `to`, or out of the world when `to` is absent.
#[derive(Debug, Clone, Copy)]
pub struct Move;

impl EventHandler for Move {
    fn name(&self) -> &str {
        "move"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let args = action.reader();
        let entity = args.entity("entity")?;
        let to = args.opt_entity("to")?;
        ctx.world.move_entity(&entity, to.as_ref())?;
        Ok(())
    }
}

fn flag_arg(action: &EventAction) -> SchedResult<(EntityId, Flag)> {
    let args = action.reader();
    let entity = args.entity("entity")?;
    let flag = args
        .str("flag")?
        .parse::<Flag>()
        .map_err(|e| args.invalid("flag", e.to_string()))?;
    Ok((entity, flag))
}

/// Sets `flag` on `entity`.
#[derive(Debug, Clone, Copy)]
pub struct SetFlag;

impl EventHandler for SetFlag {
    fn name(&self) -> &str {
        "set_flag"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let (entity, flag) = flag_arg(action)?;
        ctx.world.set_flag(&entity, flag)?;
        Ok(())
    }
}

/// Clears `flag` on `entity`.
#[derive(Debug, Clone, Copy)]
pub struct ClearFlag;

impl EventHandler for ClearFlag {
    fn name(&self) -> &str {
        "clear_flag"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let (entity, flag) = flag_arg(action)?;
        ctx.world.clear_flag(&entity, flag)?;
        Ok(())
    }
}

/// Sets property `key` on `entity` to `value`.
#[derive(Debug, Clone, Copy)]
pub struct SetProperty;

impl EventHandler for SetProperty {
    fn name(&self) -> &str {
        "set_property"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let args = action.reader();
        let entity = args.entity("entity")?;
        let key = args.str("key")?;
        let value = args
            .get("value")
            .cloned()
            .ok_or_else(|| args.invalid("value", "missing"))?;
        ctx.world.set_property(&entity, key, value)?;
        Ok(())
    }
}

/// Ends the game with `reason`, printing optional `text` first.
#[derive(Debug, Clone, Copy)]
pub struct GameOver;

impl EventHandler for GameOver {
    fn name(&self) -> &str {
        "game_over"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let args = action.reader();
        if let Some(text) = args.opt_str("text")? {
            ctx.say(text);
        }
        let reason = args.opt_str("reason")?.unwrap_or("ended");
        ctx.end_game(reason);
        Ok(())
    }
}

/// Daemon enforcing the story's deadline.
///
/// Ends the game once the clock reaches `deadline`. With `warning_at` and
/// `warning`, prints the warning on the advance that crosses `warning_at`.
#[derive(Debug, Clone, Copy)]
pub struct TimeLimit;

impl TimeLimit {
    /// Text shown when time runs out, unless `message` overrides it.
    pub const DEFAULT_MESSAGE: &'static str = "Time has run out. The investigation is closed.";
}

impl EventHandler for TimeLimit {
    fn name(&self) -> &str {
        "time_limit"
    }

    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()> {
        let args = action.reader();
        let deadline = args.int("deadline")?;
        if let (Some(at), Some(warning)) = (args.opt_int("warning_at")?, args.opt_str("warning")?) {
            if ctx.since() < at && at <= ctx.now() && ctx.now() < deadline {
                ctx.say(warning);
            }
        }
        if ctx.now() >= deadline {
            let message = args.opt_str("message")?.unwrap_or(Self::DEFAULT_MESSAGE);
            ctx.say(message);
            ctx.end_game("time");
        }
        Ok(())
    }
}
