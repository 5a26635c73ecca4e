use serde::{Deserialize, Serialize};
use uw_core::EntityId;

/// Who did it, and what the player must have found to prove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// The guilty character.
    pub culprit: EntityId,
    /// Evidence entities that must be `collected` before accusing.
    #[serde(default)]
    pub required_evidence: Vec<EntityId>,
}

/// Engine configuration. Usually embedded in the content file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clock value when the story begins.
    pub start_minute: i64,
    /// Minutes after the start when the game ends. `None` means no limit.
    pub time_limit: Option<i64>,
    /// Minute (after the start) at which the time-limit warning is shown.
    pub warning_at: Option<i64>,
    /// Text of the time-limit warning.
    pub warning: Option<String>,
    /// Minutes a physical action costs.
    pub minutes_per_action: u32,
    /// Longest a single `wait` may last.
    pub max_wait: u32,
    /// Minutes a bare `wait` lasts.
    pub default_wait: u32,
    /// Load the built-in English verbs before content words.
    pub standard_vocabulary: bool,
    /// Load the built-in grammar after content rules.
    pub standard_grammar: bool,
    /// Upper bound for the score.
    pub max_score: i64,
    /// The mystery's answer, if the story has one.
    pub solution: Option<Solution>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_minute: 480,
            time_limit: Some(720),
            warning_at: None,
            warning: None,
            minutes_per_action: 1,
            max_wait: 180,
            default_wait: 10,
            standard_vocabulary: true,
            standard_grammar: true,
            max_score: 100,
            solution: None,
        }
    }
}

impl EngineConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting minute.
    pub fn with_start_minute(mut self, minute: i64) -> Self {
        self.start_minute = minute;
        self
    }

    /// Set or remove the time limit.
    pub fn with_time_limit(mut self, minutes: Option<i64>) -> Self {
        self.time_limit = minutes;
        self
    }

    /// Show `text` once `minutes` after the start have passed.
    pub fn with_warning(mut self, minutes: i64, text: impl Into<String>) -> Self {
        self.warning_at = Some(minutes);
        self.warning = Some(text.into());
        self
    }

    /// Set the cost of a physical action.
    pub fn with_minutes_per_action(mut self, minutes: u32) -> Self {
        self.minutes_per_action = minutes;
        self
    }

    /// Set the longest allowed wait.
    pub fn with_max_wait(mut self, minutes: u32) -> Self {
        self.max_wait = minutes;
        self
    }

    /// Set the score cap.
    pub fn with_max_score(mut self, score: i64) -> Self {
        self.max_score = score;
        self
    }

    /// Set the solution.
    pub fn with_solution(mut self, solution: Solution) -> Self {
        self.solution = Some(solution);
        self
    }

    /// Absolute minute at which time runs out.
    pub fn deadline(&self) -> Option<i64> {
        self.time_limit.map(|limit| self.start_minute + limit)
    }
}
