use uw_core::{EntityId, EntityKind, Flag};
use uw_parser::Command;

use super::{
    ActionContext, ActionHandler, EVIDENCE_COLLECTED, Outcome, collect_evidence, direct, indirect,
    target, the,
};
use crate::describe::join_list;
use crate::error::{EngineResult, Refusal};

/// `take OBJ [from OBJ]`. Collecting evidence emits a signal.
#[derive(Debug, Clone, Copy)]
pub struct Take;

impl ActionHandler for Take {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let item = target(ctx.world, cmd.direct.as_ref())?;
        if item.id == ctx.actor {
            return Err(Refusal::new("You can't take yourself."));
        }
        if item.location() == Some(&ctx.actor) {
            return Err(Refusal::new("You already have that."));
        }
        if item.kind.is_person() {
            return Err(Refusal::new(format!("{} wouldn't appreciate that.", the(item))));
        }
        if item.has_flag(Flag::Fixed) {
            return Err(Refusal::new(format!("{} is fixed in place.", the(item))));
        }
        if item.kind == EntityKind::Location || !item.has_flag(Flag::Portable) {
            return Err(Refusal::new("You can't take that."));
        }
        if let Some(source) = cmd.indirect.as_ref() {
            let source = target(ctx.world, Some(source))?;
            if !source.directly_contains(&item.id) {
                return Err(Refusal::new(format!(
                    "{} isn't in {}.",
                    the(item),
                    source.definite_name()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let item = direct(cmd)?;
        let actor = ctx.actor.clone();
        ctx.world.move_entity(item, Some(&actor))?;
        let mut outcome = Outcome::say("Taken.").taking(ctx.action_minutes());
        if collect_evidence(ctx.world, item)? {
            outcome = outcome.signal(EVIDENCE_COLLECTED);
        }
        Ok(outcome)
    }
}

/// `drop`: onto whatever the actor stands in.
#[derive(Debug, Clone, Copy)]
pub struct Drop;

impl ActionHandler for Drop {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let item = target(ctx.world, cmd.direct.as_ref())?;
        if ctx.holds(&item.id) {
            Ok(())
        } else {
            Err(Refusal::new(format!("You aren't holding {}.", item.definite_name())))
        }
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let item = direct(cmd)?;
        let floor = ctx.entity(&ctx.actor)?.location().cloned();
        ctx.world.move_entity(item, floor.as_ref())?;
        Ok(Outcome::say("Dropped.").taking(ctx.action_minutes()))
    }
}

/// Shared checks for putting the direct object into or onto the indirect one.
fn check_placement(cmd: &Command, ctx: &ActionContext<'_>, holder_flag: Flag) -> Result<(), Refusal> {
    let item = target(ctx.world, cmd.direct.as_ref())?;
    let holder = target(ctx.world, cmd.indirect.as_ref())?;
    if item.id == holder.id || ctx.world.is_within(&holder.id, &item.id) {
        return Err(Refusal::new("You can't put something inside itself."));
    }
    if !holder.has_flag(holder_flag) {
        let preposition = if holder_flag == Flag::Surface { "on" } else { "in" };
        return Err(Refusal::new(format!(
            "You can't put things {preposition} {}.",
            holder.definite_name()
        )));
    }
    if holder_flag == Flag::Container && !holder.has_flag(Flag::Open) {
        return Err(Refusal::new(format!("{} is closed.", the(holder))));
    }
    let capacity = holder.int_property_or("capacity", i64::MAX);
    let used = i64::try_from(holder.contents().count()).unwrap_or(i64::MAX);
    if used >= capacity {
        return Err(Refusal::new(format!(
            "There's no more room {} {}.",
            if holder_flag == Flag::Surface { "on" } else { "in" },
            holder.definite_name()
        )));
    }
    Ok(())
}

fn place(cmd: &Command, ctx: &mut ActionContext<'_>, preposition: &str) -> EngineResult<Outcome> {
    let item = direct(cmd)?;
    let holder = indirect(cmd)?;
    ctx.world.move_entity(item, Some(holder))?;
    let line = format!(
        "You put {} {preposition} {}.",
        ctx.entity(item)?.definite_name(),
        ctx.entity(holder)?.definite_name()
    );
    Ok(Outcome::say(line).taking(ctx.action_minutes()))
}

/// `put OBJ in OBJ`.
#[derive(Debug, Clone, Copy)]
pub struct PutIn;

impl ActionHandler for PutIn {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        check_placement(cmd, ctx, Flag::Container)
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        place(cmd, ctx, "in")
    }
}

/// `put OBJ on OBJ`.
#[derive(Debug, Clone, Copy)]
pub struct PutOn;

impl ActionHandler for PutOn {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        check_placement(cmd, ctx, Flag::Surface)
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        place(cmd, ctx, "on")
    }
}

/// `open`, announcing anything it reveals.
#[derive(Debug, Clone, Copy)]
pub struct Open;

impl ActionHandler for Open {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let thing = target(ctx.world, cmd.direct.as_ref())?;
        if !thing.has_flag(Flag::Openable) {
            return Err(Refusal::new("You can't open that."));
        }
        if thing.has_flag(Flag::Open) {
            return Err(Refusal::new(format!("{} is already open.", the(thing))));
        }
        if thing.has_flag(Flag::Locked) {
            return Err(Refusal::new(format!("{} is locked.", the(thing))));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let id = direct(cmd)?;
        ctx.world.set_flag(id, Flag::Open)?;
        let revealed: Vec<String> = ctx
            .world
            .visible_children(id)
            .into_iter()
            .map(|e| e.indefinite_name())
            .collect();
        let line = if revealed.is_empty() {
            "Opened.".to_string()
        } else {
            format!(
                "Opening {} reveals {}.",
                ctx.entity(id)?.definite_name(),
                join_list(&revealed, "and")
            )
        };
        Ok(Outcome::say(line).taking(ctx.action_minutes()))
    }
}

/// `close`.
#[derive(Debug, Clone, Copy)]
pub struct Close;

impl ActionHandler for Close {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let thing = target(ctx.world, cmd.direct.as_ref())?;
        if !thing.has_flag(Flag::Openable) {
            return Err(Refusal::new("You can't close that."));
        }
        if !thing.has_flag(Flag::Open) {
            return Err(Refusal::new(format!("{} is already closed.", the(thing))));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        ctx.world.clear_flag(direct(cmd)?, Flag::Open)?;
        Ok(Outcome::say("Closed.").taking(ctx.action_minutes()))
    }
}

/// Which key the player is using: the named one, or the right one if held.
fn check_key(cmd: &Command, ctx: &ActionContext<'_>) -> Result<EntityId, Refusal> {
    let thing = target(ctx.world, cmd.direct.as_ref())?;
    let Some(key) = thing.text_property("key").map(EntityId::new) else {
        return Err(Refusal::new(format!("{} has no lock.", the(thing))));
    };
    match cmd.indirect.as_ref() {
        Some(used) => {
            let used = target(ctx.world, Some(used))?;
            if !ctx.holds(&used.id) {
                return Err(Refusal::new(format!("You aren't holding {}.", used.definite_name())));
            }
            if used.id != key {
                return Err(Refusal::new(format!("{} doesn't fit the lock.", the(used))));
            }
            Ok(key)
        }
        None if ctx.holds(&key) => Ok(key),
        None => Err(Refusal::new("You don't have the right key.")),
    }
}

/// `lock OBJ [with OBJ]`. The `key` property names the matching key.
#[derive(Debug, Clone, Copy)]
pub struct Lock;

impl ActionHandler for Lock {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let thing = target(ctx.world, cmd.direct.as_ref())?;
        if !thing.has_flag(Flag::Openable) {
            return Err(Refusal::new("You can't lock that."));
        }
        if thing.has_flag(Flag::Locked) {
            return Err(Refusal::new(format!("{} is already locked.", the(thing))));
        }
        if thing.has_flag(Flag::Open) {
            return Err(Refusal::new(format!(
                "You'll have to close {} first.",
                thing.definite_name()
            )));
        }
        check_key(cmd, ctx).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        ctx.world.set_flag(direct(cmd)?, Flag::Locked)?;
        Ok(Outcome::say("Locked.").taking(ctx.action_minutes()))
    }
}

/// `unlock OBJ [with OBJ]`.
#[derive(Debug, Clone, Copy)]
pub struct Unlock;

impl ActionHandler for Unlock {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let thing = target(ctx.world, cmd.direct.as_ref())?;
        if !thing.has_flag(Flag::Locked) {
            return Err(Refusal::new(format!("{} isn't locked.", the(thing))));
        }
        check_key(cmd, ctx).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        ctx.world.clear_flag(direct(cmd)?, Flag::Locked)?;
        Ok(Outcome::say("Unlocked.").taking(ctx.action_minutes()))
    }
}

/// `light`: only things that provide light.
#[derive(Debug, Clone, Copy)]
pub struct Light;

impl ActionHandler for Light {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let thing = target(ctx.world, cmd.direct.as_ref())?;
        if !thing.has_flag(Flag::ProvidesLight) {
            return Err(Refusal::new("You can't light that."));
        }
        if thing.has_flag(Flag::Lit) {
            return Err(Refusal::new(format!("{} is already lit.", the(thing))));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let id = direct(cmd)?;
        ctx.world.set_flag(id, Flag::Lit)?;
        let line = format!("{} is now lit.", the(ctx.entity(id)?));
        Ok(Outcome::say(line).taking(ctx.action_minutes()))
    }
}

/// `extinguish`.
#[derive(Debug, Clone, Copy)]
pub struct Extinguish;

impl ActionHandler for Extinguish {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let thing = target(ctx.world, cmd.direct.as_ref())?;
        if !thing.has_flag(Flag::ProvidesLight) {
            return Err(Refusal::new("You can't extinguish that."));
        }
        if !thing.has_flag(Flag::Lit) {
            return Err(Refusal::new(format!("{} isn't lit.", the(thing))));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let id = direct(cmd)?;
        ctx.world.clear_flag(id, Flag::Lit)?;
        let line = format!("You put out {}.", ctx.entity(id)?.definite_name());
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
    fn take_and_drop() {
        let mut world = world();
        let out = run(&mut world, cmd("take").with_direct("note"));
        assert_eq!(out.narrative, ["Taken."]);
        assert_eq!(out.minutes, 1);
        assert_eq!(world.get(&"note".into()).unwrap().location(), Some(&EntityId::new("me")));

        let out = run(&mut world, cmd("take").with_direct("note"));
        assert_eq!(out.narrative, ["You already have that."]);
        assert_eq!(out.minutes, 0);

        let out = run(&mut world, cmd("drop").with_direct("note"));
        assert_eq!(out.narrative, ["Dropped."]);
        assert_eq!(world.get(&"note".into()).unwrap().location(), Some(&EntityId::new("hall")));
    }

    #[test]
    fn take_refusals() {
        let mut world = world();
        assert_eq!(
            run(&mut world, cmd("take").with_direct("butler")).narrative,
            ["Hobbs wouldn't appreciate that."]
        );
        assert_eq!(
            run(&mut world, cmd("take").with_direct("table")).narrative,
            ["The table is fixed in place."]
        );
        assert_eq!(
            run(&mut world, cmd("take").with_direct("note").with_indirect("box")).narrative,
            ["The note isn't in the wooden box."]
        );
    }

    #[test]
    fn taking_evidence_signals() {
        let mut world = world();
        world.set_flag(&"box".into(), Flag::Open).unwrap();
        let out = run(&mut world, cmd("take").with_direct("ring").with_indirect("box"));
        assert_eq!(out.signals, [EVIDENCE_COLLECTED]);
        assert!(world.flag(&"ring".into(), Flag::Collected));

        run(&mut world, cmd("drop").with_direct("ring"));
        let out = run(&mut world, cmd("take").with_direct("ring"));
        assert!(out.signals.is_empty());
    }

    #[test]
    fn containers_open_close_and_hold() {
        let mut world = world();
        run(&mut world, cmd("take").with_direct("note"));

        let out = run(&mut world, cmd("put_in").with_direct("note").with_indirect("box"));
        assert_eq!(out.narrative, ["The wooden box is closed."]);

        let out = run(&mut world, cmd("open").with_direct("box"));
        assert_eq!(out.narrative, ["Opening the wooden box reveals a gold ring."]);

        let out = run(&mut world, cmd("put_in").with_direct("note").with_indirect("box"));
        assert_eq!(out.narrative, ["You put the note in the wooden box."]);

        let out = run(&mut world, cmd("put_in").with_direct("box").with_indirect("box"));
        assert_eq!(out.narrative, ["You can't put something inside itself."]);

        let out = run(&mut world, cmd("put_on").with_direct("box").with_indirect("table"));
        assert_eq!(out.narrative, ["You put the wooden box on the table."]);

        let out = run(&mut world, cmd("close").with_direct("box"));
        assert_eq!(out.narrative, ["Closed."]);
        let out = run(&mut world, cmd("close").with_direct("box"));
        assert_eq!(out.narrative, ["The wooden box is already closed."]);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut world = world();
        world.set_flag(&"box".into(), Flag::Open).unwrap();
        world.set_property(&"box".into(), "capacity", 1).unwrap();
        run(&mut world, cmd("take").with_direct("note"));
        let out = run(&mut world, cmd("put_in").with_direct("note").with_indirect("box"));
        assert_eq!(out.narrative, ["There's no more room in the wooden box."]);
    }

    #[test]
    fn locks_need_the_right_key() {
        let mut world = world();
        let out = run(&mut world, cmd("lock").with_direct("box"));
        assert_eq!(out.narrative, ["You don't have the right key."]);

        run(&mut world, cmd("take").with_direct("note"));
        let out = run(&mut world, cmd("lock").with_direct("box").with_indirect("note"));
        assert_eq!(out.narrative, ["The note doesn't fit the lock."]);

        run(&mut world, cmd("take").with_direct("key"));
        let out = run(&mut world, cmd("lock").with_direct("box"));
        assert_eq!(out.narrative, ["Locked."]);
        let out = run(&mut world, cmd("open").with_direct("box"));
        assert_eq!(out.narrative, ["The wooden box is locked."]);
        let out = run(&mut world, cmd("unlock").with_direct("box").with_indirect("key"));
        assert_eq!(out.narrative, ["Unlocked."]);
    }

    #[test]
    fn lamps_light_and_go_out() {
        let mut world = world();
        assert_eq!(
            run(&mut world, cmd("light").with_direct("note")).narrative,
            ["You can't light that."]
        );
        assert_eq!(
            run(&mut world, cmd("light").with_direct("lamp")).narrative,
            ["The oil lamp is now lit."]
        );
        assert!(world.flag(&"lamp".into(), Flag::Lit));
        assert_eq!(
            run(&mut world, cmd("extinguish").with_direct("lamp")).narrative,
            ["You put out the oil lamp."]
        );
    }
}
