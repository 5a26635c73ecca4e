//! Core types for Uhrwerk: entities, containment, and the world model.
//!
//! This crate is the entity store every other layer reads and mutates. It
//! knows nothing about parsing or time; worlds are built programmatically or
//! deserialized from content by the engine.

/// Typed component data (exits, dialogue, schedules).
pub mod component;
/// Entity types, identifiers, flags and property values.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Query builder for filtering entities.
pub mod query;
/// Snapshots of mutable entity state.
pub mod state;
/// The central world model that owns entities and containment.
pub mod world;

/// Re-export component types.
pub use component::{CharacterComponent, ComponentSet, Direction, LocationComponent, ScheduleEntry};
/// Re-export core entity types.
pub use entity::{Entity, EntityId, EntityKind, Flag, PropertyValue};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export state snapshot types.
pub use state::EntityState;
/// Re-export world model types.
pub use world::{World, WorldMeta};
