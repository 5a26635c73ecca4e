//! Game clock and time-driven events for Uhrwerk.
//!
//! The [`Scheduler`] owns the clock, a queue of one-shot events and a list of
//! daemons that run once per time-consuming advance. Events are plain data
//! (a handler name plus arguments) so the whole pending queue can be saved
//! and restored. NPC schedules are ordinary daemons built on the same
//! machinery.

/// Game clock and time formatting.
pub mod clock;
/// Mutable context passed to handlers.
pub mod context;
/// Error types for the scheduler crate.
pub mod error;
/// Event data and the one-shot queue.
pub mod event;
/// The handler trait and registry.
pub mod handler;
/// Built-in handlers.
pub mod handlers;
/// NPC schedule follower.
pub mod schedule;
/// The scheduler itself.
pub mod scheduler;

/// Re-exports of clock types and helpers.
pub use clock::{GameClock, MINUTES_PER_DAY, format_duration, format_minute};
/// Re-export of [`context::EventContext`].
pub use context::EventContext;
/// Re-exports of [`error::SchedError`], [`error::SchedResult`] and [`error::DaemonError`].
pub use error::{DaemonError, SchedError, SchedResult};
/// Re-exports of event types.
pub use event::{ArgReader, Daemon, EventAction, EventArgs, EventId, EventQueue, ScheduledEvent};
/// Re-exports of [`handler::EventHandler`] and [`handler::HandlerRegistry`].
pub use handler::{EventHandler, HandlerRegistry};
/// Re-exports of schedule-following helpers.
pub use schedule::{ScheduleFollower, install_schedules};
/// Re-exports of [`scheduler::Scheduler`] and its report and state types.
pub use scheduler::{AdvanceReport, Scheduler, SchedulerState};
