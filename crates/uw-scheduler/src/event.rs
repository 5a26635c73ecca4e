use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uw_core::{EntityId, PropertyValue};

use crate::error::{SchedError, SchedResult};

/// Arguments passed to an event handler.
pub type EventArgs = BTreeMap<String, PropertyValue>;

/// Identifier of a scheduled event or daemon. Assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an event does: a handler name plus serializable arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAction {
    /// Registered handler name.
    pub handler: String,
    /// Handler arguments.
    #[serde(default)]
    pub args: EventArgs,
}

impl EventAction {
    /// An action with no arguments.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            args: EventArgs::new(),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Typed access to the arguments, for use inside handlers.
    pub fn reader(&self) -> ArgReader<'_> {
        ArgReader::new(&self.handler, &self.args)
    }
}

/// Reads handler arguments, turning absence and type mismatches into
/// [`SchedError`]s that name the handler.
#[derive(Debug, Clone, Copy)]
pub struct ArgReader<'a> {
    handler: &'a str,
    args: &'a EventArgs,
}

impl<'a> ArgReader<'a> {
    /// Wrap `args` for `handler`.
    pub fn new(handler: &'a str, args: &'a EventArgs) -> Self {
        Self { handler, args }
    }

    /// Raw value, if present.
    pub fn get(&self, key: &str) -> Option<&'a PropertyValue> {
        self.args.get(key)
    }

    /// A required string argument.
    pub fn str(&self, key: &str) -> SchedResult<&'a str> {
        match self.get(key) {
            Some(value) => value.as_str().ok_or_else(|| self.invalid(key, "expected a string")),
            None => Err(self.missing(key)),
        }
    }

    /// An optional string argument.
    pub fn opt_str(&self, key: &str) -> SchedResult<Option<&'a str>> {
        match self.get(key) {
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a string")),
            None => Ok(None),
        }
    }

    /// A required entity id argument.
    pub fn entity(&self, key: &str) -> SchedResult<EntityId> {
        self.str(key).map(EntityId::new)
    }

    /// An optional entity id argument.
    pub fn opt_entity(&self, key: &str) -> SchedResult<Option<EntityId>> {
        Ok(self.opt_str(key)?.map(EntityId::new))
    }

    /// A required integer argument.
    pub fn int(&self, key: &str) -> SchedResult<i64> {
        match self.get(key) {
            Some(value) => value.as_i64().ok_or_else(|| self.invalid(key, "expected a number")),
            None => Err(self.missing(key)),
        }
    }

    /// An optional integer argument.
    pub fn opt_int(&self, key: &str) -> SchedResult<Option<i64>> {
        match self.get(key) {
            Some(_) => self.int(key).map(Some),
            None => Ok(None),
        }
    }

    /// Build an invalid-argument error for `key`.
    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> SchedError {
        SchedError::InvalidArgument {
            handler: self.handler.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn missing(&self, key: &str) -> SchedError {
        SchedError::MissingArgument {
            handler: self.handler.to_string(),
            key: key.to_string(),
        }
    }
}

/// A one-shot event waiting in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Registration-order id; breaks ties between equal keys.
    pub id: EventId,
    /// Absolute minute at which the event fires.
    pub fire_at: i64,
    /// Lower fires first among events with the same `fire_at`.
    pub priority: i32,
    /// What to run.
    pub action: EventAction,
}

impl ScheduledEvent {
    fn key(&self) -> (i64, i32, EventId) {
        (self.fire_at, self.priority, self.id)
    }
}

/// A recurring action run once per clock advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daemon {
    /// Registration-order id.
    pub id: EventId,
    /// What to run.
    pub action: EventAction,
}

/// One-shot events ordered by `(fire_at, priority, id)`.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: BTreeMap<(i64, i32, EventId), ScheduledEvent>,
}

impl EventQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event.
    pub fn push(&mut self, event: ScheduledEvent) {
        self.events.insert(event.key(), event);
    }

    /// Remove and return the earliest event if it fires at or before `until`.
    pub fn pop_due(&mut self, until: i64) -> Option<ScheduledEvent> {
        let first = self.events.first_key_value()?;
        if first.1.fire_at > until {
            return None;
        }
        self.events.pop_first().map(|(_, event)| event)
    }

    /// The earliest event without removing it.
    pub fn peek(&self) -> Option<&ScheduledEvent> {
        self.events.values().next()
    }

    /// Remove the event with this id.
    pub fn cancel(&mut self, id: EventId) -> Option<ScheduledEvent> {
        let key = self.events.values().find(|e| e.id == id)?.key();
        self.events.remove(&key)
    }

    /// Remove every event running `handler`. Returns how many were removed.
    pub fn cancel_handler(&mut self, handler: &str) -> usize {
        let before = self.events.len();
        self.events.retain(|_, e| e.action.handler != handler);
        before - self.events.len()
    }

    /// Events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.values()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
