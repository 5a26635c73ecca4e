//! Grammar rules: token-role patterns bound to action handlers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uw_core::Flag;

use crate::error::GrammarError;

/// One element of a grammar pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    /// A verb word resolving to this verb id.
    Verb(String),
    /// One of these literal words, usually prepositions.
    Literal(BTreeSet<String>),
    /// A noun phrase. The first is the direct object, the second the indirect.
    Object,
    /// A direction word.
    Direction,
    /// The rest of the line, one word or more.
    Text,
    /// A number.
    Number,
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verb(v) => write!(f, "{v}"),
            Self::Literal(words) => {
                let words: Vec<&str> = words.iter().map(String::as_str).collect();
                write!(f, "{}", words.join("|"))
            }
            Self::Object => write!(f, "OBJ"),
            Self::Direction => write!(f, "DIR"),
            Self::Text => write!(f, "TEXT"),
            Self::Number => write!(f, "NUM"),
        }
    }
}

/// Which candidates win when a noun phrase is still ambiguous after
/// flag preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
    /// Things lying in the room beat things the actor carries.
    #[default]
    Room,
    /// Things the actor carries beat things lying in the room.
    Held,
}

/// A pattern bound to an action, tried in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    /// Elements to match, in order.
    pub pattern: Vec<PatternElement>,
    /// Action handler id.
    pub action: String,
    /// Precondition id checked before dispatch.
    pub precondition: Option<String>,
    /// Flag that makes a direct-object candidate preferable.
    pub prefer: Option<Flag>,
    /// Room-versus-inventory tie break.
    pub favor: Locality,
    source: String,
}

impl GrammarRule {
    /// Build a rule from a pattern string such as `"put OBJ in|into OBJ"`.
    ///
    /// The first bare word names the verb id; later bare words (with `|`
    /// alternatives) are literals. `OBJ`, `DIR`, `TEXT` and `NUM` are slots.
    pub fn parse(pattern: &str, action: impl Into<String>) -> Result<Self, GrammarError> {
        let action = action.into();
        let mut elements = Vec::new();
        for (i, part) in pattern.split_whitespace().enumerate() {
            let element = match part {
                "OBJ" => PatternElement::Object,
                "DIR" => PatternElement::Direction,
                "TEXT" => PatternElement::Text,
                "NUM" => PatternElement::Number,
                word if i == 0 => PatternElement::Verb(word.to_lowercase()),
                words => PatternElement::Literal(
                    words
                        .split('|')
                        .filter(|w| !w.is_empty())
                        .map(str::to_lowercase)
                        .collect(),
                ),
            };
            elements.push(element);
        }

        if elements.is_empty() {
            return Err(GrammarError::EmptyPattern { action });
        }
        let objects = elements
            .iter()
            .filter(|e| **e == PatternElement::Object)
            .count();
        if objects > 2 {
            return Err(GrammarError::TooManyObjects {
                pattern: pattern.to_string(),
            });
        }
        if let Some(pos) = elements.iter().position(|e| *e == PatternElement::Text) {
            if pos + 1 != elements.len() {
                return Err(GrammarError::TextNotLast {
                    pattern: pattern.to_string(),
                });
            }
        }

        Ok(Self {
            pattern: elements,
            action,
            precondition: None,
            prefer: None,
            favor: Locality::Room,
            source: pattern.trim().to_string(),
        })
    }

    /// Attach a precondition id.
    pub fn with_precondition(mut self, id: impl Into<String>) -> Self {
        self.precondition = Some(id.into());
        self
    }

    /// Prefer direct-object candidates with `flag`.
    pub fn preferring(mut self, flag: Flag) -> Self {
        self.prefer = Some(flag);
        self
    }

    /// Prefer candidates the actor carries.
    pub fn favoring_held(mut self) -> Self {
        self.favor = Locality::Held;
        self
    }

    /// The verb id this rule starts with, if any.
    pub fn verb(&self) -> Option<&str> {
        match self.pattern.first() {
            Some(PatternElement::Verb(v)) => Some(v),
            _ => None,
        }
    }

    /// Whether the pattern has an object slot.
    pub fn takes_object(&self) -> bool {
        self.pattern.contains(&PatternElement::Object)
    }

    /// The pattern string the rule was built from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.action)
    }
}

/// Rules in priority order.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    rules: Vec<GrammarRule>,
}

impl Grammar {
    /// An empty grammar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule at the lowest priority.
    pub fn push(&mut self, rule: GrammarRule) {
        self.rules.push(rule);
    }

    /// Rules in the order they are tried.
    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The built-in English grammar.
    pub fn standard() -> Self {
        let mut grammar = Self::new();
        let mut add = |pattern: &str, action: &str, tweak: fn(GrammarRule) -> GrammarRule| {
            if let Ok(rule) = GrammarRule::parse(pattern, action) {
                grammar.push(tweak(rule));
            }
        };
        let plain = |r: GrammarRule| r;
        let lit = |r: GrammarRule| r.with_precondition("needs_light");

        add("look", "look", plain);
        add("look around", "look", plain);
        add("look in|inside|into OBJ", "examine", lit);
        add("look under|behind OBJ", "search", lit);
        add("examine OBJ", "examine", lit);

        add("take OBJ", "take", |r| r.preferring(Flag::Portable).with_precondition("needs_light"));
        add("take OBJ from|off OBJ", "take", |r| {
            r.preferring(Flag::Portable).with_precondition("needs_light")
        });
        add("drop OBJ", "drop", |r| r.favoring_held().with_precondition("holding_direct"));
        add("put OBJ down", "drop", |r| r.favoring_held().with_precondition("holding_direct"));
        add("put OBJ in|into|inside OBJ", "put_in", |r| {
            r.favoring_held().with_precondition("holding_direct")
        });
        add("put OBJ on|onto OBJ", "put_on", |r| {
            r.favoring_held().with_precondition("holding_direct")
        });

        add("open OBJ", "open", |r| r.preferring(Flag::Openable));
        add("close OBJ", "close", |r| r.preferring(Flag::Openable));
        add("lock OBJ with OBJ", "lock", |r| r.preferring(Flag::Openable));
        add("lock OBJ", "lock", |r| r.preferring(Flag::Openable));
        add("unlock OBJ with OBJ", "unlock", |r| r.preferring(Flag::Openable));
        add("unlock OBJ", "unlock", |r| r.preferring(Flag::Openable));

        add("read OBJ", "read", |r| r.preferring(Flag::Readable).with_precondition("needs_light"));
        add("search OBJ", "search", lit);
        add("search", "search", lit);
        add("light OBJ", "light", |r| r.preferring(Flag::ProvidesLight));
        add("extinguish OBJ", "extinguish", |r| r.preferring(Flag::ProvidesLight));

        add("go DIR", "go", plain);
        add("DIR", "go", plain);

        add("talk to|with OBJ", "talk", |r| r.preferring(Flag::Person));
        add("talk OBJ", "talk", |r| r.preferring(Flag::Person));
        add("ask OBJ about TEXT", "ask", |r| r.preferring(Flag::Person));
        add("tell OBJ about TEXT", "tell", |r| r.preferring(Flag::Person));
        add("show OBJ to OBJ", "show", |r| r.favoring_held().with_precondition("holding_direct"));
        add("accuse OBJ", "accuse", |r| r.preferring(Flag::Person));
        add("accuse OBJ of TEXT", "accuse", |r| r.preferring(Flag::Person));

        add("inventory", "inventory", plain);
        add("wait", "wait", plain);
        add("wait NUM", "wait", plain);
        add("wait NUM minute|minutes", "wait", plain);
        add("wait for NUM minute|minutes", "wait", plain);
        add("time", "time", plain);
        add("score", "score", plain);
        add("help", "help", plain);
        add("save", "save", plain);
        add("restore", "restore", plain);
        add("quit", "quit", plain);

        grammar
    }
}
