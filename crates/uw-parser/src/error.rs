use crate::resolver::Ambiguity;

/// Alias for `Result<T, ParseFailure>`.
pub type ParseResult<T> = Result<T, ParseFailure>;

/// Why a line of input could not become a command.
///
/// Every variant renders as the message the player sees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    /// Nothing was typed.
    #[error("I beg your pardon?")]
    Empty,

    /// A word that is not in the vocabulary.
    #[error("I don't know the word \"{word}\".{hint}", hint = did_you_mean(.suggestion))]
    UnknownWord {
        /// The word as typed.
        word: String,
        /// Closest vocabulary word, if any is close enough.
        suggestion: Option<String>,
    },

    /// All words known, but no grammar rule fits.
    #[error("I don't understand that.")]
    NotUnderstood,

    /// A verb that needs an object was typed alone.
    #[error("What do you want to {verb}?")]
    Incomplete {
        /// The verb as typed.
        verb: String,
    },

    /// No entity in scope matches the noun phrase.
    #[error("I don't see any {phrase} here.")]
    NotHere {
        /// The noun phrase as typed.
        phrase: String,
    },

    /// Several entities in scope match the noun phrase.
    #[error("{0}")]
    Ambiguous(Box<Ambiguity>),

    /// A pronoun with nothing to refer to.
    #[error("I don't know what \"{pronoun}\" refers to.")]
    UnknownReference {
        /// The pronoun as typed.
        pronoun: String,
    },
}

/// Problems with an authored grammar pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// The pattern string has no elements.
    #[error("empty grammar pattern for action \"{action}\"")]
    EmptyPattern {
        /// The action the rule was meant for.
        action: String,
    },

    /// More than two object slots.
    #[error("pattern \"{pattern}\" has more than two OBJ slots")]
    TooManyObjects {
        /// The offending pattern.
        pattern: String,
    },

    /// TEXT must be the final element.
    #[error("pattern \"{pattern}\" has elements after TEXT")]
    TextNotLast {
        /// The offending pattern.
        pattern: String,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(word) => format!(" Did you mean \"{word}\"?"),
        None => String::new(),
    }
}
