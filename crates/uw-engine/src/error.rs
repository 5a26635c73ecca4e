//! Error types for the engine.

use std::fmt;

use thiserror::Error;
use uw_core::{CoreError, EntityId};
use uw_parser::GrammarError;
use uw_scheduler::SchedError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort loading or a turn.
///
/// Player mistakes never end up here: parse failures and refusals become
/// narrative text in the turn result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The world model rejected an operation.
    #[error(transparent)]
    World(#[from] CoreError),

    /// The scheduler rejected an operation.
    #[error(transparent)]
    Scheduler(#[from] SchedError),

    /// A grammar pattern in the content is malformed.
    #[error("bad grammar rule: {0}")]
    Grammar(#[from] GrammarError),

    /// Content or snapshot JSON could not be read.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Content is well-formed JSON but inconsistent.
    #[error("invalid content: {0}")]
    Content(String),

    /// A snapshot does not fit the loaded world.
    #[error("snapshot rejected: {0}")]
    Snapshot(String),

    /// A command names an action no handler is registered for.
    #[error("no handler for action \"{0}\"")]
    UnknownAction(String),

    /// An entity hook names an override that does not exist.
    #[error("{entity}: no override handler named \"{hook}\"")]
    UnknownOverride {
        /// The entity carrying the hook.
        entity: EntityId,
        /// The override id.
        hook: String,
    },

    /// A grammar rule names a precondition that does not exist.
    #[error("no precondition named \"{0}\"")]
    UnknownPrecondition(String),

    /// A handler needed an object slot the grammar did not fill.
    #[error("action \"{action}\" needs a {slot} object")]
    MissingObject {
        /// The action being run.
        action: String,
        /// "direct" or "indirect".
        slot: &'static str,
    },
}

/// Why a well-formed command cannot be carried out right now.
///
/// Shown to the player verbatim; costs no time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refusal(pub String);

impl Refusal {
    /// A refusal with this message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
