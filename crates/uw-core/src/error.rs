use crate::component::Direction;
use crate::entity::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the world model.
///
/// Everything here except `PropertyNotFound` indicates broken content or an
/// engine bug: the world is never left half-mutated when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// The requested entity ID does not exist in the world.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with the same ID already exists.
    #[error("entity already exists: \"{0}\"")]
    DuplicateId(EntityId),

    /// A move would make an entity contain itself.
    #[error("moving {entity} into {target} would create a containment cycle")]
    ContainmentCycle {
        /// The entity being moved.
        entity: EntityId,
        /// The requested new container.
        target: EntityId,
    },

    /// The entity has no property with this key.
    #[error("{entity} has no property \"{key}\"")]
    PropertyNotFound {
        /// The entity that was queried.
        entity: EntityId,
        /// The missing key.
        key: String,
    },

    /// An exit points at something that is not a location.
    #[error("exit {direction} from {from} leads to {to}, which is not a location")]
    InvalidExit {
        /// The room holding the exit.
        from: EntityId,
        /// The exit direction.
        direction: Direction,
        /// The exit target.
        to: EntityId,
    },

    /// A generic validation error with a descriptive message.
    #[error("validation error: {0}")]
    Validation(String),
}
