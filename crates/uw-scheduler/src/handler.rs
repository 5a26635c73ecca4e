use std::collections::BTreeMap;
use std::fmt;

use crate::context::EventContext;
use crate::error::SchedResult;
use crate::event::EventAction;
use crate::handlers;
use crate::schedule::ScheduleFollower;

/// Code behind a scheduled event.
///
/// Handlers are stateless: anything they need to remember between
/// invocations lives in the world or in the event's arguments, so the
/// pending queue can be saved as plain data.
pub trait EventHandler: fmt::Debug {
    /// Name events refer to this handler by.
    fn name(&self) -> &str;

    /// Run once for `action` at `ctx.now()`.
    fn fire(&self, action: &EventAction, ctx: &mut EventContext<'_>) -> SchedResult<()>;
}

/// Handlers by name.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Box<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in handler.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(handlers::Message);
        registry.register(handlers::Move);
        registry.register(handlers::SetFlag);
        registry.register(handlers::ClearFlag);
        registry.register(handlers::SetProperty);
        registry.register(handlers::GameOver);
        registry.register(handlers::TimeLimit);
        registry.register(ScheduleFollower);
        registry
    }

    /// Add or replace a handler.
    pub fn register<H: EventHandler + 'static>(&mut self, handler: H) {
        self.handlers
            .insert(handler.name().to_string(), Box::new(handler));
    }

    /// Look up a handler.
    pub fn get(&self, name: &str) -> Option<&dyn EventHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    /// Whether a handler with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}
