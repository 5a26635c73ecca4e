use uw_core::{Flag, World};
use uw_parser::Command;
use uw_scheduler::GameClock;

use super::{ActionContext, ActionHandler, Outcome};
use crate::config::EngineConfig;
use crate::describe::inventory_lines;
use crate::error::EngineResult;

/// Signal asking the front end to write a snapshot.
pub const SAVE_REQUESTED: &str = "save-requested";
/// Signal asking the front end to load a snapshot.
pub const RESTORE_REQUESTED: &str = "restore-requested";
/// Game-over reason for `quit`.
pub const QUIT: &str = "quit";

const HELP: &[&str] = &[
    "Movement: GO NORTH, or just N, S, E, W, NE, NW, SE, SW, UP, DOWN, IN, OUT.",
    "Looking: LOOK, EXAMINE (X) something, READ, SEARCH.",
    "Handling: TAKE, DROP, PUT something IN or ON something, OPEN, CLOSE, LOCK, UNLOCK, LIGHT.",
    "People: TALK TO, ASK someone ABOUT something, TELL, SHOW something TO someone, ACCUSE.",
    "Game: INVENTORY (I), WAIT (Z) or WAIT 30, TIME, SCORE, AGAIN (G), SAVE, RESTORE, QUIT.",
];

/// Sum of `evidence_value` over collected entities, capped at the
/// configured maximum.
pub fn score(world: &World, config: &EngineConfig) -> i64 {
    let total: i64 = world
        .query()
        .flag(Flag::Collected)
        .has_property("evidence_value")
        .execute()
        .into_iter()
        .map(|e| e.int_property_or("evidence_value", 0))
        .sum();
    total.clamp(0, config.max_score)
}

/// `inventory`.
#[derive(Debug, Clone, Copy)]
pub struct Inventory;

impl ActionHandler for Inventory {
    fn execute(&self, _cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        Ok(Outcome::lines(inventory_lines(ctx.world, &ctx.actor)))
    }
}

/// `wait [NUM]`: lets the clock run.
#[derive(Debug, Clone, Copy)]
pub struct Wait;

impl ActionHandler for Wait {
    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let max = ctx.config.max_wait.max(1);
        let minutes = match cmd.number {
            Some(n) => u32::try_from(n.clamp(1, i64::from(max))).unwrap_or(max),
            None => ctx.config.default_wait.clamp(1, max),
        };
        Ok(Outcome::say("Time passes.").taking(minutes))
    }
}

/// `time`.
#[derive(Debug, Clone, Copy)]
pub struct Time;

impl ActionHandler for Time {
    fn execute(&self, _cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let clock = GameClock::new(ctx.now);
        let line = match clock.day() {
            0 => format!("It is {clock}."),
            day => format!("It is {clock} on day {}.", day + 1),
        };
        Ok(Outcome::say(line))
    }
}

/// `score`.
#[derive(Debug, Clone, Copy)]
pub struct Score;

impl ActionHandler for Score {
    fn execute(&self, _cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let points = score(ctx.world, ctx.config);
        let mut outcome = Outcome::say(format!(
            "Your score is {points} of a possible {}, in {} moves.",
            ctx.config.max_score, ctx.moves
        ));
        let found = ctx
            .world
            .query()
            .flag(Flag::Evidence)
            .flag(Flag::Collected)
            .count();
        if found > 0 {
            let noun = if found == 1 { "piece" } else { "pieces" };
            outcome = outcome.and_say(format!("You have collected {found} {noun} of evidence."));
        }
        Ok(outcome)
    }
}

/// `help`.
#[derive(Debug, Clone, Copy)]
pub struct Help;

impl ActionHandler for Help {
    fn execute(&self, _cmd: &Command, _ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        Ok(Outcome::lines(HELP.iter().map(|l| l.to_string()).collect()))
    }
}

/// `save`. The front end does the writing.
#[derive(Debug, Clone, Copy)]
pub struct Save;

impl ActionHandler for Save {
    fn execute(&self, _cmd: &Command, _ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        Ok(Outcome::default().signal(SAVE_REQUESTED))
    }
}

/// `restore`. The front end does the reading.
#[derive(Debug, Clone, Copy)]
pub struct Restore;

impl ActionHandler for Restore {
    fn execute(&self, _cmd: &Command, _ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        Ok(Outcome::default().signal(RESTORE_REQUESTED))
    }
}

/// `quit`.
#[derive(Debug, Clone, Copy)]
pub struct Quit;

impl ActionHandler for Quit {
    fn execute(&self, _cmd: &Command, _ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let mut outcome = Outcome::say("Goodbye.");
        outcome.quit = true;
        outcome.game_over = Some(QUIT.to_string());
        Ok(outcome)
    }
}
