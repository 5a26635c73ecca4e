//! The turn loop.

use tracing::{debug, info};
use uw_core::{EntityId, World};
use uw_parser::{Ambiguity, Command, Interpreter, ParseFailure, ParseResult, ResolveContext};
use uw_scheduler::{DaemonError, Scheduler};

use crate::action::{ActionContext, ActionDispatcher, Outcome, meta};
use crate::config::EngineConfig;
use crate::content::{Content, LoadedWorld, load_world};
use crate::describe::describe_room;
use crate::error::{EngineError, EngineResult};

/// Reply to anything typed after the story has ended.
pub const GAME_IS_OVER: &str = "The game is over.";

/// How the story ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOver {
    /// Machine-readable reason: "solved", "time", "quit" and so on.
    pub reason: String,
}

/// Everything one submitted line produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnResult {
    /// Lines for the player: the action's own text, then anything events said.
    pub narrative: Vec<String>,
    /// Whether the clock moved.
    pub time_advanced: bool,
    /// How far it moved.
    pub minutes: u32,
    /// Signals from the action and from events, in that order.
    pub signals: Vec<String>,
    /// Set once the story has ended.
    pub game_over: Option<GameOver>,
    /// Set when a noun phrase matched several things. Pass it to
    /// [`Game::clarify`] with the player's answer.
    pub ambiguity: Option<Box<Ambiguity>>,
    /// Event handlers that failed during the advance.
    pub errors: Vec<DaemonError>,
    /// Clock after the turn.
    pub clock: i64,
}

impl TurnResult {
    fn say(line: impl Into<String>, clock: i64) -> Self {
        Self {
            narrative: vec![line.into()],
            clock,
            ..Self::default()
        }
    }

    /// The narrative as one block of text.
    pub fn text(&self) -> String {
        self.narrative.join("\n")
    }
}

/// A running story: world, interpreter, scheduler and dispatcher, plus the
/// little state the loop itself keeps.
#[derive(Debug)]
pub struct Game {
    pub(crate) world: World,
    pub(crate) interpreter: Interpreter,
    pub(crate) scheduler: Scheduler,
    pub(crate) dispatcher: ActionDispatcher,
    pub(crate) config: EngineConfig,
    pub(crate) moves: u32,
    pub(crate) last_referent: Option<EntityId>,
    pub(crate) last_input: Option<String>,
    pub(crate) game_over: Option<String>,
}

impl Game {
    /// Load `content` and start a game with the built-in handlers.
    pub fn new(content: &Content) -> EngineResult<Self> {
        Self::from_loaded(load_world(content)?)
    }

    /// Parse and load a content file.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        Self::new(&Content::from_json(text)?)
    }

    /// Start a game from an already loaded world.
    pub fn from_loaded(loaded: LoadedWorld) -> EngineResult<Self> {
        Self::with_dispatcher(loaded, ActionDispatcher::standard())
    }

    /// Start a game with custom handlers.
    ///
    /// Every grammar rule's action and precondition and every entity hook
    /// must have a handler in `dispatcher`.
    pub fn with_dispatcher(loaded: LoadedWorld, dispatcher: ActionDispatcher) -> EngineResult<Self> {
        for rule in loaded.interpreter.grammar().rules() {
            if !dispatcher.has_action(&rule.action) {
                return Err(EngineError::UnknownAction(rule.action.clone()));
            }
            if let Some(precondition) = &rule.precondition {
                if !dispatcher.has_precondition(precondition) {
                    return Err(EngineError::UnknownPrecondition(precondition.clone()));
                }
            }
        }
        for entity in loaded.world.all_entities() {
            if let Some(hook) = entity.hooks.values().find(|h| !dispatcher.has_override(h)) {
                return Err(EngineError::UnknownOverride {
                    entity: entity.id.clone(),
                    hook: hook.clone(),
                });
            }
        }
        loaded.world.player_id()?;

        info!(title = %loaded.world.meta.title, "game started");
        Ok(Self {
            world: loaded.world,
            interpreter: loaded.interpreter,
            scheduler: loaded.scheduler,
            dispatcher,
            config: loaded.config,
            moves: 0,
            last_referent: None,
            last_input: None,
            game_over: None,
        })
    }

    /// Opening text: title, author, intro and the first room.
    pub fn intro(&self) -> EngineResult<Vec<String>> {
        let meta = &self.world.meta;
        let mut lines = vec![meta.title.clone()];
        if let Some(author) = &meta.author {
            lines.push(format!("by {author}"));
        }
        if let Some(intro) = &meta.intro {
            lines.push(String::new());
            lines.push(intro.clone());
        }
        lines.push(String::new());
        lines.extend(describe_room(&self.world, self.world.player_id()?));
        Ok(lines)
    }

    /// Run one line of player input.
    ///
    /// Parse failures and refusals are ordinary narrative. Errors mean the
    /// content or a handler is broken.
    pub fn submit_command(&mut self, raw: &str) -> EngineResult<TurnResult> {
        if self.game_over.is_some() {
            return Ok(self.over());
        }
        let trimmed = raw.trim();
        let input = if matches!(trimmed.to_lowercase().as_str(), "again" | "g") {
            match &self.last_input {
                Some(previous) => previous.clone(),
                None => return Ok(TurnResult::say("No previous command to repeat.", self.now())),
            }
        } else {
            trimmed.to_string()
        };
        if !input.is_empty() {
            self.last_input = Some(input.clone());
        }

        let parsed = {
            let actor = self.world.player_id()?;
            let ctx = ResolveContext::new(actor).with_referent(self.last_referent.as_ref());
            self.interpreter.interpret(&input, &self.world, &ctx)
        };
        self.settle(parsed)
    }

    /// Answer a "Which do you mean" question from the previous turn.
    ///
    /// A reply that picks none of the candidates is run as a fresh command,
    /// so typing "north" instead of answering simply walks north.
    pub fn clarify(&mut self, ambiguity: &Ambiguity, reply: &str) -> EngineResult<TurnResult> {
        if self.game_over.is_some() {
            return Ok(self.over());
        }
        let parsed = {
            let actor = self.world.player_id()?;
            let ctx = ResolveContext::new(actor).with_referent(self.last_referent.as_ref());
            self.interpreter.disambiguate(&self.world, &ctx, ambiguity, reply)
        };
        match parsed {
            Err(
                ParseFailure::UnknownWord { .. }
                | ParseFailure::NotUnderstood
                | ParseFailure::NotHere { .. },
            ) => {
                debug!(reply, "clarification not understood; treating as a command");
                self.submit_command(reply)
            }
            other => self.settle(other),
        }
    }

    fn settle(&mut self, parsed: ParseResult<Command>) -> EngineResult<TurnResult> {
        match parsed {
            Ok(command) => self.execute(command),
            Err(failure) => {
                debug!(%failure, "parse failed");
                let ambiguity = match &failure {
                    ParseFailure::Ambiguous(ambiguity) => Some(ambiguity.clone()),
                    _ => None,
                };
                let mut turn = TurnResult::say(failure.to_string(), self.now());
                turn.ambiguity = ambiguity;
                Ok(turn)
            }
        }
    }

    /// Dispatch an already resolved command and let time pass.
    pub fn execute(&mut self, command: Command) -> EngineResult<TurnResult> {
        if self.game_over.is_some() {
            return Ok(self.over());
        }
        if let Some(referent) = command.referent() {
            self.last_referent = Some(referent.clone());
        }
        let outcome = {
            let mut ctx = ActionContext {
                actor: self.world.player_id()?.clone(),
                world: &mut self.world,
                config: &self.config,
                now: self.scheduler.now(),
                moves: self.moves,
            };
            self.dispatcher.dispatch(&command, &mut ctx)?
        };
        Ok(self.conclude(outcome))
    }

    fn conclude(&mut self, outcome: Outcome) -> TurnResult {
        let Outcome {
            narrative,
            minutes,
            signals,
            quit,
            game_over,
        } = outcome;
        let mut turn = TurnResult {
            narrative,
            signals,
            ..TurnResult::default()
        };
        if let Some(reason) = game_over {
            self.game_over = Some(reason);
        } else if quit {
            self.game_over = Some(meta::QUIT.to_string());
        }

        if minutes > 0 && self.game_over.is_none() {
            self.moves += 1;
            let report = self.scheduler.advance(&mut self.world, minutes);
            turn.time_advanced = report.to > report.from;
            turn.minutes = minutes;
            turn.narrative.extend(report.narrative);
            turn.signals.extend(report.signals);
            turn.errors = report.errors;
            if let Some(reason) = report.game_over {
                self.game_over = Some(reason);
            }
        }

        if let Some(reason) = &self.game_over {
            info!(reason = %reason, moves = self.moves, "game over");
        }
        turn.game_over = self.game_over.clone().map(|reason| GameOver { reason });
        turn.clock = self.scheduler.now();
        turn
    }

    fn over(&self) -> TurnResult {
        let mut turn = TurnResult::say(GAME_IS_OVER, self.now());
        turn.game_over = self.game_over.clone().map(|reason| GameOver { reason });
        turn
    }

    /// The world as it stands.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The scheduler, for inspecting pending events.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The interpreter.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time-consuming turns taken.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Current score.
    pub fn score(&self) -> i64 {
        meta::score(&self.world, &self.config)
    }

    /// Current clock value.
    pub fn now(&self) -> i64 {
        self.scheduler.now()
    }

    /// What a pronoun refers to right now.
    pub fn last_referent(&self) -> Option<&EntityId> {
        self.last_referent.as_ref()
    }

    /// Why the game ended, if it has.
    pub fn game_over(&self) -> Option<&str> {
        self.game_over.as_deref()
    }

    /// Whether the story has ended.
    pub fn is_over(&self) -> bool {
        self.game_over.is_some()
    }
}
