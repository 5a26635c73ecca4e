use uw_core::CoreError;

/// Alias for `Result<T, SchedError>`.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors raised while scheduling or firing events.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedError {
    /// No handler is registered under this name.
    #[error("no event handler named \"{0}\"")]
    UnknownHandler(String),

    /// A required argument is absent.
    #[error("{handler}: missing argument \"{key}\"")]
    MissingArgument {
        /// The handler that needed it.
        handler: String,
        /// The argument key.
        key: String,
    },

    /// An argument has the wrong type or value.
    #[error("{handler}: bad argument \"{key}\": {reason}")]
    InvalidArgument {
        /// The handler that rejected it.
        handler: String,
        /// The argument key.
        key: String,
        /// What was wrong.
        reason: String,
    },

    /// An event was scheduled before the current time.
    #[error("cannot schedule at minute {at}, clock already reads {now}")]
    InThePast {
        /// Requested fire time.
        at: i64,
        /// Current clock.
        now: i64,
    },

    /// The world rejected a mutation.
    #[error(transparent)]
    World(#[from] CoreError),
}

/// A handler that failed during `advance`.
///
/// Recorded in the [`crate::AdvanceReport`]; the clock keeps going and the
/// event is not retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{handler} failed at minute {at}: {source}")]
pub struct DaemonError {
    /// Handler name.
    pub handler: String,
    /// Fire time of the failed invocation.
    pub at: i64,
    /// The underlying failure.
    pub source: SchedError,
}
