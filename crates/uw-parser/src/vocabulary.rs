//! Word lookup: surface words to roles and the things they denote.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uw_core::{Direction, EntityId};

/// Grammatical role of a vocabulary word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordRole {
    /// Names an action.
    Verb,
    /// Names an entity.
    Noun,
    /// Narrows a noun.
    Adjective,
    /// Links two objects ("in", "with").
    Preposition,
    /// A compass or vertical direction.
    Direction,
}

impl fmt::Display for WordRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verb => write!(f, "verb"),
            Self::Noun => write!(f, "noun"),
            Self::Adjective => write!(f, "adjective"),
            Self::Preposition => write!(f, "preposition"),
            Self::Direction => write!(f, "direction"),
        }
    }
}

/// What a word resolves to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// An entity in the world.
    Entity(EntityId),
    /// A verb id used by grammar rules.
    Verb(String),
    /// A direction.
    Direction(Direction),
}

/// One role a word plays, with everything it can denote in that role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    /// The role.
    pub role: WordRole,
    /// Denotations. Empty for prepositions.
    pub targets: BTreeSet<Target>,
}

/// Articles are dropped after tagging.
pub const ARTICLES: [&str; 4] = ["a", "an", "the", "some"];

/// Pronouns resolve against the last referenced entity.
pub const PRONOUNS: [&str; 4] = ["it", "them", "him", "her"];

/// Maps words to their senses. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: BTreeMap<String, Vec<Sense>>,
    max_phrase_len: usize,
}

impl Vocabulary {
    /// An empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `word` in `role` denoting `target`.
    ///
    /// Adding the same word and role again merges the targets, which is how
    /// one noun comes to denote several entities. Words may contain spaces
    /// to form multi-word entries such as "pick up".
    pub fn add(&mut self, word: &str, role: WordRole, target: Option<Target>) {
        let word = normalize(word);
        if word.is_empty() {
            return;
        }
        let len = word.split(' ').count();
        self.max_phrase_len = self.max_phrase_len.max(len);

        let senses = self.words.entry(word).or_default();
        let sense = match senses.iter().position(|s| s.role == role) {
            Some(i) => &mut senses[i],
            None => {
                senses.push(Sense {
                    role,
                    targets: BTreeSet::new(),
                });
                senses.sort_by_key(|s| s.role);
                let i = senses.iter().position(|s| s.role == role).unwrap_or(0);
                &mut senses[i]
            }
        };
        if let Some(target) = target {
            sense.targets.insert(target);
        }
    }

    /// Register a verb word (or phrase) for a verb id.
    pub fn add_verb(&mut self, word: &str, verb: &str) {
        self.add(word, WordRole::Verb, Some(Target::Verb(verb.to_string())));
    }

    /// Register a noun for an entity.
    pub fn add_noun(&mut self, word: &str, entity: &EntityId) {
        self.add(word, WordRole::Noun, Some(Target::Entity(entity.clone())));
    }

    /// Register an adjective for an entity.
    pub fn add_adjective(&mut self, word: &str, entity: &EntityId) {
        self.add(word, WordRole::Adjective, Some(Target::Entity(entity.clone())));
    }

    /// Register a preposition.
    pub fn add_preposition(&mut self, word: &str) {
        self.add(word, WordRole::Preposition, None);
    }

    /// Register a direction word.
    pub fn add_direction(&mut self, word: &str, direction: Direction) {
        self.add(word, WordRole::Direction, Some(Target::Direction(direction)));
    }

    /// All senses of `word`. Case-insensitive; an unknown plural is retried
    /// in singular form. Unknown words yield an empty slice.
    pub fn lookup(&self, word: &str) -> &[Sense] {
        let word = normalize(word);
        if let Some(senses) = self.words.get(&word) {
            return senses;
        }
        singular_forms(&word)
            .into_iter()
            .find_map(|w| self.words.get(&w))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `word` has any sense.
    pub fn contains(&self, word: &str) -> bool {
        !self.lookup(word).is_empty()
    }

    /// Whether `word` has a sense with `role`.
    pub fn has_role(&self, word: &str, role: WordRole) -> bool {
        self.lookup(word).iter().any(|s| s.role == role)
    }

    /// Whether an exact multi-word entry exists. No plural folding.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        self.words.contains_key(phrase)
    }

    /// Longest multi-word entry, in words.
    pub fn max_phrase_len(&self) -> usize {
        self.max_phrase_len
    }

    /// Every known word, for suggestions.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether no words are registered.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The built-in English verbs, prepositions and directions.
    pub fn standard() -> Self {
        let mut vocab = Self::new();

        let verbs: &[(&str, &[&str])] = &[
            ("look", &["look", "l"]),
            ("examine", &["examine", "x", "inspect", "look at", "check", "describe"]),
            ("take", &["take", "get", "grab", "pick up", "carry", "steal"]),
            ("drop", &["drop", "put down", "discard", "release"]),
            ("put", &["put", "place", "insert", "stuff"]),
            ("open", &["open"]),
            ("close", &["close", "shut"]),
            ("lock", &["lock"]),
            ("unlock", &["unlock"]),
            ("read", &["read", "peruse"]),
            ("search", &["search", "rummage"]),
            ("light", &["light", "turn on", "switch on"]),
            ("extinguish", &["extinguish", "turn off", "switch off", "douse"]),
            ("go", &["go", "walk", "run", "head"]),
            ("talk", &["talk", "speak", "chat"]),
            ("ask", &["ask", "question", "interrogate"]),
            ("tell", &["tell", "inform"]),
            ("show", &["show", "present"]),
            ("accuse", &["accuse", "arrest"]),
            ("inventory", &["inventory", "i", "inv"]),
            ("wait", &["wait", "z"]),
            ("time", &["time"]),
            ("score", &["score"]),
            ("help", &["help", "hint", "hints"]),
            ("save", &["save"]),
            ("restore", &["restore", "load"]),
            ("quit", &["quit", "q"]),
        ];
        for (verb, words) in verbs {
            for word in *words {
                vocab.add_verb(word, verb);
            }
        }

        for prep in [
            "in", "into", "inside", "on", "onto", "with", "to", "about", "at", "from", "under",
            "behind", "minute", "minutes",
        ] {
            vocab.add_preposition(prep);
        }

        for dir in Direction::ALL {
            vocab.add_direction(dir.name(), dir);
            vocab.add_direction(dir.abbreviation(), dir);
        }
        vocab.add_direction("inside", Direction::In);
        vocab.add_direction("outside", Direction::Out);

        vocab
    }
}

fn normalize(word: &str) -> String {
    word.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Candidate singular forms, most specific first.
fn singular_forms(word: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if word.len() > 3 {
        if let Some(stem) = word.strip_suffix("es") {
            forms.push(stem.to_string());
        }
    }
    if word.len() > 2 {
        if let Some(stem) = word.strip_suffix('s') {
            if !stem.ends_with('s') {
                forms.push(stem.to_string());
            }
        }
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_vocab() -> Vocabulary {
        let mut vocab = Vocabulary::standard();
        vocab.add_noun("key", &"brass_key".into());
        vocab.add_noun("key", &"silver_key".into());
        vocab.add_adjective("brass", &"brass_key".into());
        vocab.add_adjective("silver", &"silver_key".into());
        vocab.add_noun("box", &"box".into());
        vocab
    }

    #[test]
    fn duplicate_nouns_merge_targets() {
        let vocab = key_vocab();
        let senses = vocab.lookup("key");
        assert_eq!(senses.len(), 1);
        assert_eq!(senses[0].role, WordRole::Noun);
        assert_eq!(senses[0].targets.len(), 2);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let vocab = key_vocab();
        assert_eq!(vocab.lookup("KEY"), vocab.lookup("key"));
    }

    #[test]
    fn plurals_fold_to_singular() {
        let vocab = key_vocab();
        assert_eq!(vocab.lookup("keys"), vocab.lookup("key"));
        assert_eq!(vocab.lookup("boxes"), vocab.lookup("box"));
    }

    #[test]
    fn unknown_words_are_empty() {
        let vocab = key_vocab();
        assert!(vocab.lookup("xyzzy").is_empty());
        assert!(!vocab.contains("xyzzy"));
    }

    #[test]
    fn words_can_have_several_roles() {
        let vocab = Vocabulary::standard();
        assert!(vocab.has_role("in", WordRole::Preposition));
        assert!(vocab.has_role("in", WordRole::Direction));
    }

    #[test]
    fn multi_word_entries() {
        let vocab = Vocabulary::standard();
        assert!(vocab.contains_phrase("pick up"));
        assert!(vocab.max_phrase_len() >= 2);
        let senses = vocab.lookup("look at");
        assert!(senses[0]
            .targets
            .contains(&Target::Verb("examine".to_string())));
    }
}
