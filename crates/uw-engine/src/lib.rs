//! Turn loop, content loading and action dispatch for Uhrwerk.
//!
//! A [`Game`] ties the world model, the interpreter and the scheduler
//! together. Each call to [`Game::submit_command`] interprets one line,
//! dispatches the resulting command to an [`ActionHandler`], and if the
//! action took time, advances the clock so events and characters can act.
//!
//! ```
//! use uw_engine::Game;
//!
//! let content = r#"{
//!     "title": "Cupboard",
//!     "entities": [
//!         { "id": "hall", "kind": "location", "name": "Hall" },
//!         { "id": "me", "kind": "player", "name": "yourself", "location": "hall" },
//!         { "id": "coin", "kind": "item", "name": "coin", "location": "hall",
//!           "flags": ["portable"] }
//!     ]
//! }"#;
//! let mut game = Game::from_json(content).unwrap();
//! let turn = game.submit_command("take the coin").unwrap();
//! assert_eq!(turn.narrative, ["Taken."]);
//! assert_eq!(game.now(), 481);
//! ```

/// Action handlers and the dispatcher.
pub mod action;
/// Engine settings.
pub mod config;
/// Content files and world loading.
pub mod content;
/// Room, container and inventory descriptions.
pub mod describe;
/// Error types for the engine crate.
pub mod error;
/// The game session and turn results.
pub mod session;
/// Saved-game snapshots.
pub mod snapshot;

/// Re-exports of the dispatch types.
pub use action::{ActionContext, ActionDispatcher, ActionHandler, EVIDENCE_COLLECTED, Outcome, Precondition};
/// Re-exports of [`config::EngineConfig`] and [`config::Solution`].
pub use config::{EngineConfig, Solution};
/// Re-exports of content types and the loader.
pub use content::{Content, EntityDef, EventDef, LoadedWorld, RuleDef, WordDef, load_world};
/// Re-exports of [`error::EngineError`], [`error::EngineResult`] and [`error::Refusal`].
pub use error::{EngineError, EngineResult, Refusal};
/// Re-exports of the session types.
pub use session::{GAME_IS_OVER, Game, GameOver, TurnResult};
/// Re-exports of [`snapshot::Snapshot`] and its version.
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
