use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uw_core::World;

use crate::clock::GameClock;
use crate::context::{EventContext, Spawn};
use crate::error::{DaemonError, SchedError, SchedResult};
use crate::event::{Daemon, EventAction, EventId, EventQueue, ScheduledEvent};
use crate::handler::{EventHandler, HandlerRegistry};

/// Everything that happened during one [`Scheduler::advance`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceReport {
    /// Clock value before the advance.
    pub from: i64,
    /// Clock value after the advance.
    pub to: i64,
    /// Narrative lines produced by handlers, in firing order.
    pub narrative: Vec<String>,
    /// Named signals emitted by handlers.
    pub signals: Vec<String>,
    /// Set when a handler ended the game.
    pub game_over: Option<String>,
    /// Number of handler invocations, one-shots and daemons together.
    pub fired: usize,
    /// Handlers that failed. The clock still advanced.
    pub errors: Vec<DaemonError>,
}

/// Serializable scheduler state: the clock plus everything pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    /// Clock value.
    pub now: i64,
    /// Next id to hand out.
    pub next_id: u64,
    /// Pending one-shot events in firing order.
    pub pending: Vec<ScheduledEvent>,
    /// Daemons in registration order.
    pub daemons: Vec<Daemon>,
}

/// Owns the game clock, the one-shot queue and the daemons.
///
/// `advance` first drains every one-shot due up to the target minute, each
/// run at its own fire time, then sets the clock and ticks every daemon
/// once in registration order.
#[derive(Debug)]
pub struct Scheduler {
    clock: GameClock,
    queue: EventQueue,
    daemons: Vec<Daemon>,
    next_id: u64,
    handlers: HandlerRegistry,
}

impl Scheduler {
    /// A scheduler starting at `start_minute` with the built-in handlers.
    pub fn new(start_minute: i64) -> Self {
        Self {
            clock: GameClock::new(start_minute),
            queue: EventQueue::new(),
            daemons: Vec::new(),
            next_id: 1,
            handlers: HandlerRegistry::with_builtins(),
        }
    }

    /// Add or replace a handler.
    pub fn register_handler<H: EventHandler + 'static>(&mut self, handler: H) {
        self.handlers.register(handler);
    }

    /// The registered handlers.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Current clock value.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// The clock.
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Schedule `action` to fire `delay` minutes from now.
    pub fn schedule_once(&mut self, delay: i64, action: EventAction, priority: i32) -> SchedResult<EventId> {
        self.schedule_at(self.now() + delay.max(0), action, priority)
    }

    /// Schedule `action` at absolute minute `at`.
    pub fn schedule_at(&mut self, at: i64, action: EventAction, priority: i32) -> SchedResult<EventId> {
        if at < self.now() {
            return Err(SchedError::InThePast { at, now: self.now() });
        }
        self.check_handler(&action)?;
        let id = self.allocate_id();
        debug!(id = %id, at, handler = %action.handler, "event scheduled");
        self.queue.push(ScheduledEvent {
            id,
            fire_at: at,
            priority,
            action,
        });
        Ok(id)
    }

    /// Add a daemon that runs once per time-consuming advance.
    pub fn schedule_recurring(&mut self, action: EventAction) -> SchedResult<EventId> {
        self.check_handler(&action)?;
        let id = self.allocate_id();
        debug!(id = %id, handler = %action.handler, "daemon registered");
        self.daemons.push(Daemon { id, action });
        Ok(id)
    }

    /// Remove a pending event or daemon. Returns whether anything was removed.
    pub fn cancel(&mut self, id: EventId) -> bool {
        if self.queue.cancel(id).is_some() {
            return true;
        }
        let before = self.daemons.len();
        self.daemons.retain(|d| d.id != id);
        before != self.daemons.len()
    }

    /// Remove every pending event and daemon running `handler`.
    pub fn cancel_handler(&mut self, handler: &str) -> usize {
        let before = self.daemons.len();
        self.daemons.retain(|d| d.action.handler != handler);
        self.queue.cancel_handler(handler) + (before - self.daemons.len())
    }

    /// Pending one-shot events in firing order.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.queue.iter()
    }

    /// Registered daemons in order.
    pub fn daemons(&self) -> &[Daemon] {
        &self.daemons
    }

    /// Advance the clock by `minutes`, firing everything that falls due.
    ///
    /// Handler failures are collected in the report and never stop the
    /// clock. Once a handler ends the game nothing further fires, but the
    /// clock still reaches the target.
    pub fn advance(&mut self, world: &mut World, minutes: u32) -> AdvanceReport {
        let since = self.now();
        let target = since + i64::from(minutes);
        let mut report = AdvanceReport {
            from: since,
            to: target,
            ..AdvanceReport::default()
        };

        while report.game_over.is_none() {
            let Some(event) = self.queue.pop_due(target) else {
                break;
            };
            let spawned = invoke(
                &self.handlers,
                world,
                &event.action,
                event.fire_at,
                since,
                &mut report,
            );
            self.enqueue(spawned);
        }

        self.clock.advance_to(target);

        if minutes > 0 {
            for daemon in self.daemons.clone() {
                if report.game_over.is_some() {
                    break;
                }
                let spawned = invoke(&self.handlers, world, &daemon.action, target, since, &mut report);
                self.enqueue(spawned);
            }
        }

        debug!(
            from = since,
            to = target,
            fired = report.fired,
            errors = report.errors.len(),
            "clock advanced"
        );
        report
    }

    /// Capture the clock and every pending event.
    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            now: self.now(),
            next_id: self.next_id,
            pending: self.queue.iter().cloned().collect(),
            daemons: self.daemons.clone(),
        }
    }

    /// Replace the clock and pending events with `state`.
    ///
    /// Every handler named in `state` must be registered; otherwise nothing
    /// changes.
    pub fn restore(&mut self, state: SchedulerState) -> SchedResult<()> {
        for action in state
            .pending
            .iter()
            .map(|e| &e.action)
            .chain(state.daemons.iter().map(|d| &d.action))
        {
            self.check_handler(action)?;
        }
        let mut queue = EventQueue::new();
        for event in state.pending {
            queue.push(event);
        }
        self.clock = GameClock::new(state.now);
        self.queue = queue;
        self.daemons = state.daemons;
        self.next_id = state.next_id;
        Ok(())
    }

    fn check_handler(&self, action: &EventAction) -> SchedResult<()> {
        if self.handlers.contains(&action.handler) {
            Ok(())
        } else {
            Err(SchedError::UnknownHandler(action.handler.clone()))
        }
    }

    fn allocate_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }

    fn enqueue(&mut self, spawned: Vec<Spawn>) {
        for spawn in spawned {
            let id = self.allocate_id();
            self.queue.push(ScheduledEvent {
                id,
                fire_at: spawn.fire_at,
                priority: spawn.priority,
                action: spawn.action,
            });
        }
    }
}

/// Run one handler invocation, recording failures in `report`.
fn invoke(
    handlers: &HandlerRegistry,
    world: &mut World,
    action: &EventAction,
    now: i64,
    since: i64,
    report: &mut AdvanceReport,
) -> Vec<Spawn> {
    report.fired += 1;
    let Some(handler) = handlers.get(&action.handler) else {
        fail(report, action, now, SchedError::UnknownHandler(action.handler.clone()));
        return Vec::new();
    };

    debug!(handler = %action.handler, at = now, "firing");
    let mut ctx = EventContext::new(world, now, since, report);
    let result = handler.fire(action, &mut ctx);
    let spawned = ctx.into_spawned();
    match result {
        Ok(()) => spawned,
        Err(source) => {
            fail(report, action, now, source);
            Vec::new()
        }
    }
}

fn fail(report: &mut AdvanceReport, action: &EventAction, at: i64, source: SchedError) {
    warn!(handler = %action.handler, at, error = %source, "handler failed");
    report.errors.push(DaemonError {
        handler: action.handler.clone(),
        at,
        source,
    });
}
