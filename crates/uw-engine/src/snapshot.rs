//! Saved games.
//!
//! A snapshot holds only what play can change: entity locations, flags and
//! properties, the scheduler, and the loop counters. Descriptions, grammar
//! and handlers come from the content the game was loaded from, so a
//! snapshot can only be restored into a game built from the same content.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uw_core::{EntityId, EntityState};
use uw_scheduler::SchedulerState;

use crate::error::{EngineError, EngineResult};
use crate::session::Game;

/// Current snapshot layout.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Layout version.
    pub version: u32,
    /// Clock when saved. Must agree with the scheduler state.
    pub clock: i64,
    /// Mutable state of every entity.
    pub entities: BTreeMap<EntityId, EntityState>,
    /// Pending events and daemons.
    pub scheduler: SchedulerState,
    /// Time-consuming turns taken.
    pub moves: u32,
    /// Pronoun referent.
    pub last_referent: Option<EntityId>,
    /// Why the game ended, if it has.
    pub game_over: Option<String>,
}

impl Snapshot {
    /// Capture `game`.
    pub fn capture(game: &Game) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            clock: game.now(),
            entities: game.world.entity_states(),
            scheduler: game.scheduler.state(),
            moves: game.moves,
            last_referent: game.last_referent.clone(),
            game_over: game.game_over.clone(),
        }
    }

    /// Checks that need nothing but the snapshot and the loaded world's ids.
    fn check(&self, game: &Game) -> EngineResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(EngineError::Snapshot(format!(
                "unsupported version {}",
                self.version
            )));
        }
        if self.clock != self.scheduler.now {
            return Err(EngineError::Snapshot(format!(
                "clock {} disagrees with scheduler clock {}",
                self.clock, self.scheduler.now
            )));
        }
        let saved: BTreeSet<&EntityId> = self.entities.keys().collect();
        let loaded: BTreeSet<&EntityId> = game.world.all_entities().map(|e| &e.id).collect();
        if let Some(extra) = saved.difference(&loaded).next() {
            return Err(EngineError::Snapshot(format!("unknown entity {extra}")));
        }
        if let Some(missing) = loaded.difference(&saved).next() {
            return Err(EngineError::Snapshot(format!("entity {missing} is missing")));
        }
        if let Some(referent) = &self.last_referent {
            if !game.world.contains(referent) {
                return Err(EngineError::Snapshot(format!("unknown entity {referent}")));
            }
        }
        Ok(())
    }
}

impl Game {
    /// Serialize the game to JSON bytes.
    pub fn serialize_state(&self) -> EngineResult<Vec<u8>> {
        let bytes = serde_json::to_vec_pretty(&Snapshot::capture(self))?;
        info!(bytes = bytes.len(), clock = self.now(), "state saved");
        Ok(bytes)
    }

    /// Replace the game state with a snapshot.
    ///
    /// The snapshot is checked against the loaded world first. Any failure
    /// leaves the game exactly as it was.
    pub fn restore_state(&mut self, bytes: &[u8]) -> EngineResult<()> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        snapshot.check(self)?;

        let previous = self.world.entity_states();
        self.world.apply_states(&snapshot.entities)?;
        if let Err(err) = self.scheduler.restore(snapshot.scheduler) {
            warn!(error = %err, "snapshot scheduler rejected; rolling back");
            self.world.apply_states(&previous)?;
            return Err(err.into());
        }

        self.moves = snapshot.moves;
        self.last_referent = snapshot.last_referent;
        self.last_input = None;
        self.game_over = snapshot.game_over;
        info!(clock = self.now(), moves = self.moves, "state restored");
        Ok(())
    }
}
