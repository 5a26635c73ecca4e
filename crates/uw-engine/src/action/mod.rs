//! Action dispatch.
//!
//! A resolved [`Command`] is routed in three steps: the grammar rule's
//! precondition, then the direct object's override hook for the action (if
//! it has one), then the generic handler registered for the action id. Each
//! handler first checks [`ActionHandler::can_execute`] against a read-only
//! view of the world; a refusal becomes narrative and costs no time.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use uw_core::{Entity, EntityId, Flag, World};
use uw_parser::Command;

use crate::config::EngineConfig;
use crate::describe::{capitalize, is_lit};
use crate::error::{EngineError, EngineResult, Refusal};

/// Character conversation: talk, ask, tell, show, accuse.
pub mod communication;
/// Looking at things: look, examine, read, search.
pub mod examination;
/// Taking, dropping, containers, locks and lights.
pub mod manipulation;
/// Commands about the game rather than the world.
pub mod meta;
/// Walking between rooms.
pub mod movement;

/// Signal emitted when the player finds a piece of evidence.
pub const EVIDENCE_COLLECTED: &str = "evidence-collected";

/// What a handler did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Lines for the player.
    pub narrative: Vec<String>,
    /// Game minutes consumed.
    pub minutes: u32,
    /// Named signals for the front end or other observers.
    pub signals: Vec<String>,
    /// The player asked to stop.
    pub quit: bool,
    /// The action ended the story, with this reason.
    pub game_over: Option<String>,
}

impl Outcome {
    /// A single line that costs no time.
    pub fn say(line: impl Into<String>) -> Self {
        Self {
            narrative: vec![line.into()],
            ..Self::default()
        }
    }

    /// Several lines that cost no time.
    pub fn lines(narrative: Vec<String>) -> Self {
        Self {
            narrative,
            ..Self::default()
        }
    }

    /// A refused action.
    pub fn refused(refusal: Refusal) -> Self {
        Self::say(refusal.0)
    }

    /// Set the time cost.
    pub fn taking(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Add a signal.
    pub fn signal(mut self, name: impl Into<String>) -> Self {
        self.signals.push(name.into());
        self
    }

    /// Add a line.
    pub fn and_say(mut self, line: impl Into<String>) -> Self {
        self.narrative.push(line.into());
        self
    }
}

/// What a handler sees of the game.
pub struct ActionContext<'a> {
    /// The world, mutable during `execute`.
    pub world: &'a mut World,
    /// Who is acting.
    pub actor: EntityId,
    /// Engine settings.
    pub config: &'a EngineConfig,
    /// Current clock value.
    pub now: i64,
    /// Time-consuming turns so far.
    pub moves: u32,
}

impl ActionContext<'_> {
    /// Minutes a physical action costs.
    pub fn action_minutes(&self) -> u32 {
        self.config.minutes_per_action
    }

    /// Look up an entity that must exist.
    pub fn entity(&self, id: &EntityId) -> EngineResult<&Entity> {
        Ok(self.world.entity(id)?)
    }

    /// Whether the actor carries `id`, directly or inside something held.
    pub fn holds(&self, id: &EntityId) -> bool {
        self.world.is_within(id, &self.actor)
    }
}

/// The direct object of `cmd`.
pub fn direct(cmd: &Command) -> EngineResult<&EntityId> {
    cmd.direct.as_ref().ok_or_else(|| EngineError::MissingObject {
        action: cmd.action.clone(),
        slot: "direct",
    })
}

/// The indirect object of `cmd`.
pub fn indirect(cmd: &Command) -> EngineResult<&EntityId> {
    cmd.indirect.as_ref().ok_or_else(|| EngineError::MissingObject {
        action: cmd.action.clone(),
        slot: "indirect",
    })
}

/// The entity in a command slot, for use in precondition checks.
pub fn target<'w>(world: &'w World, id: Option<&EntityId>) -> Result<&'w Entity, Refusal> {
    id.and_then(|id| world.get(id))
        .ok_or_else(|| Refusal::new("You can't see any such thing."))
}

/// Mark `id` collected if it is evidence. Returns `true` the first time.
pub fn collect_evidence(world: &mut World, id: &EntityId) -> EngineResult<bool> {
    if !world.flag(id, Flag::Evidence) {
        return Ok(false);
    }
    Ok(world.set_flag(id, Flag::Collected)?)
}

/// "The lamp" for the start of a sentence.
pub fn the(entity: &Entity) -> String {
    capitalize(&entity.definite_name())
}

/// Handler for one action id.
pub trait ActionHandler: fmt::Debug {
    /// Read-only check. The default allows everything.
    fn can_execute(&self, _cmd: &Command, _ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        Ok(())
    }

    /// Carry out the action.
    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome>;
}

/// A named check a grammar rule can demand before dispatch.
pub type Precondition = fn(&Command, &ActionContext<'_>) -> Result<(), Refusal>;

/// Routes commands to handlers.
#[derive(Default)]
pub struct ActionDispatcher {
    handlers: BTreeMap<String, Box<dyn ActionHandler>>,
    overrides: BTreeMap<String, Box<dyn ActionHandler>>,
    preconditions: BTreeMap<String, Precondition>,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("preconditions", &self.preconditions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ActionDispatcher {
    /// A dispatcher with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in handler, override and precondition.
    pub fn standard() -> Self {
        let mut d = Self::new();

        d.register("look", examination::Look);
        d.register("examine", examination::Examine);
        d.register("read", examination::Read);
        d.register("search", examination::Search);

        d.register("take", manipulation::Take);
        d.register("drop", manipulation::Drop);
        d.register("put_in", manipulation::PutIn);
        d.register("put_on", manipulation::PutOn);
        d.register("open", manipulation::Open);
        d.register("close", manipulation::Close);
        d.register("lock", manipulation::Lock);
        d.register("unlock", manipulation::Unlock);
        d.register("light", manipulation::Light);
        d.register("extinguish", manipulation::Extinguish);

        d.register("go", movement::Go);

        d.register("talk", communication::Talk);
        d.register("ask", communication::Ask);
        d.register("tell", communication::Tell);
        d.register("show", communication::Show);
        d.register("accuse", communication::Accuse);

        d.register("inventory", meta::Inventory);
        d.register("wait", meta::Wait);
        d.register("time", meta::Time);
        d.register("score", meta::Score);
        d.register("help", meta::Help);
        d.register("save", meta::Save);
        d.register("restore", meta::Restore);
        d.register("quit", meta::Quit);

        d.register_override("refuse", Refuse);
        d.register_override("respond", Respond);

        d.register_precondition("holding_direct", holding_direct);
        d.register_precondition("needs_light", needs_light);
        d
    }

    /// Add or replace the generic handler for `action`.
    pub fn register<H: ActionHandler + 'static>(&mut self, action: &str, handler: H) {
        self.handlers.insert(action.to_string(), Box::new(handler));
    }

    /// Add or replace an override handler.
    pub fn register_override<H: ActionHandler + 'static>(&mut self, id: &str, handler: H) {
        self.overrides.insert(id.to_string(), Box::new(handler));
    }

    /// Add or replace a precondition.
    pub fn register_precondition(&mut self, id: &str, check: Precondition) {
        self.preconditions.insert(id.to_string(), check);
    }

    /// Whether a generic handler exists for `action`.
    pub fn has_action(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Whether an override handler exists.
    pub fn has_override(&self, id: &str) -> bool {
        self.overrides.contains_key(id)
    }

    /// Whether a precondition exists.
    pub fn has_precondition(&self, id: &str) -> bool {
        self.preconditions.contains_key(id)
    }

    /// Run `cmd`.
    pub fn dispatch(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        if let Some(id) = &cmd.precondition {
            let check = self
                .preconditions
                .get(id)
                .ok_or_else(|| EngineError::UnknownPrecondition(id.clone()))?;
            if let Err(refusal) = check(cmd, ctx) {
                debug!(action = %cmd.action, precondition = %id, "precondition refused");
                return Ok(Outcome::refused(refusal));
            }
        }

        if let Some(direct) = &cmd.direct {
            let hook = ctx
                .world
                .get(direct)
                .and_then(|e| e.override_for(&cmd.action))
                .map(str::to_string);
            if let Some(hook) = hook {
                let handler = self
                    .overrides
                    .get(&hook)
                    .ok_or_else(|| EngineError::UnknownOverride {
                        entity: direct.clone(),
                        hook: hook.clone(),
                    })?;
                debug!(action = %cmd.action, entity = %direct, hook = %hook, "override");
                return run(handler.as_ref(), cmd, ctx);
            }
        }

        let handler = self
            .handlers
            .get(&cmd.action)
            .ok_or_else(|| EngineError::UnknownAction(cmd.action.clone()))?;
        run(handler.as_ref(), cmd, ctx)
    }
}

fn run(handler: &dyn ActionHandler, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
    match handler.can_execute(cmd, ctx) {
        Ok(()) => handler.execute(cmd, ctx),
        Err(refusal) => {
            debug!(action = %cmd.action, reason = %refusal, "refused");
            Ok(Outcome::refused(refusal))
        }
    }
}

/// The actor must carry the direct object.
pub fn holding_direct(cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
    let entity = target(ctx.world, cmd.direct.as_ref())?;
    if ctx.holds(&entity.id) {
        Ok(())
    } else {
        Err(Refusal::new(format!(
            "You aren't holding {}.",
            entity.definite_name()
        )))
    }
}

/// The actor must be able to see.
pub fn needs_light(_cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
    if is_lit(ctx.world, &ctx.actor) {
        Ok(())
    } else {
        Err(Refusal::new("It's too dark to see."))
    }
}

/// Override that always refuses, with the entity's `refusal` text.
#[derive(Debug, Clone, Copy)]
pub struct Refuse;

impl ActionHandler for Refuse {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let entity = target(ctx.world, cmd.direct.as_ref())?;
        Err(Refusal::new(
            entity
                .text_property("refusal")
                .unwrap_or("You can't do that."),
        ))
    }

    fn execute(&self, _cmd: &Command, _ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        Ok(Outcome::say("You can't do that."))
    }
}

/// Override that answers with the entity's `response.<action>` text and
/// takes the usual time.
#[derive(Debug, Clone, Copy)]
pub struct Respond;

impl ActionHandler for Respond {
    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let entity = ctx.entity(direct(cmd)?)?;
        let key = format!("response.{}", cmd.action);
        let text = entity
            .text_property(&key)
            .map(str::to_string)
            .unwrap_or_else(|| "Nothing happens.".to_string());
        Ok(Outcome::say(text).taking(ctx.action_minutes()))
    }
}
