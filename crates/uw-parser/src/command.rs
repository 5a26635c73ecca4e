//! Fully resolved player commands.

use uw_core::{Direction, EntityId};

/// A command ready for dispatch: every noun phrase has become an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Action handler id chosen by the matching grammar rule.
    pub action: String,
    /// Verb id the rule was keyed on, if the pattern starts with one.
    pub verb: Option<String>,
    /// Resolved direct object.
    pub direct: Option<EntityId>,
    /// Resolved indirect object.
    pub indirect: Option<EntityId>,
    /// The preposition as typed.
    pub preposition: Option<String>,
    /// Direction slot.
    pub direction: Option<Direction>,
    /// Free text slot, lowercased.
    pub text: Option<String>,
    /// Number slot.
    pub number: Option<i64>,
    /// Precondition id attached to the matching rule.
    pub precondition: Option<String>,
    /// The raw input line.
    pub raw: String,
}

impl Command {
    /// A bare command for `action` with nothing resolved.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            verb: None,
            direct: None,
            indirect: None,
            preposition: None,
            direction: None,
            text: None,
            number: None,
            precondition: None,
            raw: String::new(),
        }
    }

    /// Set the direct object.
    pub fn with_direct(mut self, id: impl Into<EntityId>) -> Self {
        self.direct = Some(id.into());
        self
    }

    /// Set the indirect object.
    pub fn with_indirect(mut self, id: impl Into<EntityId>) -> Self {
        self.indirect = Some(id.into());
        self
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Set the text slot.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the number slot.
    pub fn with_number(mut self, n: i64) -> Self {
        self.number = Some(n);
        self
    }

    /// The entity a following "it" should refer to.
    pub fn referent(&self) -> Option<&EntityId> {
        self.direct.as_ref().or(self.indirect.as_ref())
    }
}
