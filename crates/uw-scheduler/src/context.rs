use uw_core::{EntityId, World};

use crate::event::EventAction;
use crate::scheduler::AdvanceReport;

/// An event a handler asked for while it was running.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spawn {
    pub(crate) fire_at: i64,
    pub(crate) priority: i32,
    pub(crate) action: EventAction,
}

/// Mutable context passed to each handler invocation.
pub struct EventContext<'a> {
    /// The world the handler may read and mutate.
    pub world: &'a mut World,
    now: i64,
    since: i64,
    report: &'a mut AdvanceReport,
    spawned: Vec<Spawn>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(world: &'a mut World, now: i64, since: i64, report: &'a mut AdvanceReport) -> Self {
        Self {
            world,
            now,
            since,
            report,
            spawned: Vec::new(),
        }
    }

    /// The minute this invocation fires at: the event's own fire time for
    /// one-shots, the new clock value for daemons.
    pub fn now(&self) -> i64 {
        self.now
    }

    /// The clock value before the current `advance` began.
    pub fn since(&self) -> i64 {
        self.since
    }

    /// Add a line of narrative to the turn output.
    pub fn say(&mut self, line: impl Into<String>) {
        self.report.narrative.push(line.into());
    }

    /// Emit a named signal for collaborators outside the core.
    pub fn signal(&mut self, name: impl Into<String>) {
        self.report.signals.push(name.into());
    }

    /// End the game. The first reason given wins.
    pub fn end_game(&mut self, reason: impl Into<String>) {
        if self.report.game_over.is_none() {
            self.report.game_over = Some(reason.into());
        }
    }

    /// Schedule a follow-up `delay` minutes after this invocation's fire
    /// time. It can still fire within the current `advance`.
    pub fn schedule_once(&mut self, delay: i64, action: EventAction, priority: i32) {
        self.spawned.push(Spawn {
            fire_at: self.now + delay.max(0),
            priority,
            action,
        });
    }

    /// The room the player is in, if there is a player.
    pub fn player_room(&self) -> Option<EntityId> {
        let player = self.world.player()?;
        self.world.holder_room(player).cloned()
    }

    pub(crate) fn into_spawned(self) -> Vec<Spawn> {
        self.spawned
    }
}
