//! Noun phrase resolution against what the actor can see.

use std::collections::BTreeSet;
use std::fmt;

use strsim::jaro_winkler;
use uw_core::{EntityId, Flag, World};

use crate::command::Command;
use crate::error::ParseFailure;
use crate::grammar::Locality;
use crate::vocabulary::Vocabulary;

/// Minimum similarity for a "did you mean" suggestion (0.0-1.0).
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Who is speaking and what they mentioned last.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// The acting entity, normally the player.
    pub actor: &'a EntityId,
    /// Entity a pronoun refers to.
    pub last_referent: Option<&'a EntityId>,
}

impl<'a> ResolveContext<'a> {
    /// Context for `actor` with no previous referent.
    pub fn new(actor: &'a EntityId) -> Self {
        Self {
            actor,
            last_referent: None,
        }
    }

    /// Set the pronoun referent.
    pub fn with_referent(mut self, referent: Option<&'a EntityId>) -> Self {
        self.last_referent = referent;
        self
    }
}

/// A matched noun phrase before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NounPhrase {
    /// The words as typed, articles removed.
    pub words: Vec<String>,
    /// Entities each word can denote, one set per word.
    pub constraints: Vec<BTreeSet<EntityId>>,
    /// Set when the phrase is a lone pronoun.
    pub pronoun: Option<String>,
}

impl NounPhrase {
    /// The phrase as typed.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Entities matching every word of the phrase.
    pub fn candidates(&self) -> BTreeSet<EntityId> {
        let mut sets = self.constraints.iter();
        let Some(first) = sets.next() else {
            return BTreeSet::new();
        };
        sets.fold(first.clone(), |acc, set| {
            acc.intersection(set).cloned().collect()
        })
    }
}

/// Which object slot a phrase fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// First object.
    Direct,
    /// Second object.
    Indirect,
}

/// A noun phrase matched several visible entities.
///
/// Carries enough of the half-built command for
/// [`crate::Interpreter::disambiguate`] to finish it from a clarifying reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambiguity {
    /// The matching entities, in ID order.
    pub candidates: Vec<EntityId>,
    /// Their names with definite articles, parallel to `candidates`.
    pub names: Vec<String>,
    pub(crate) pending: Pending,
}

/// The rest of a command waiting on an ambiguous slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pending {
    pub(crate) command: Command,
    pub(crate) slot: Slot,
    pub(crate) remaining: Vec<(Slot, NounPhrase)>,
    pub(crate) prefer: Option<Flag>,
    pub(crate) favor: Locality,
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Which do you mean, ")?;
        match self.names.as_slice() {
            [] => {}
            [only] => write!(f, "{only}")?,
            [a, b] => write!(f, "{a} or {b}")?,
            [init @ .., last] => write!(f, "{}, or {last}", init.join(", "))?,
        }
        write!(f, "?")
    }
}

/// Resolve one noun phrase to a single entity.
///
/// Candidates are intersected with the actor's scope, then narrowed by the
/// preferred flag and by `favor`. More than one survivor is an ambiguity;
/// the caller wraps it with the pending command.
pub(crate) fn resolve_phrase(
    world: &World,
    ctx: &ResolveContext<'_>,
    phrase: &NounPhrase,
    prefer: Option<Flag>,
    favor: Locality,
) -> Result<EntityId, Vec<EntityId>> {
    let scope = world.scope_for(ctx.actor);
    let in_scope: BTreeSet<EntityId> = match &phrase.pronoun {
        Some(_) => ctx.last_referent.into_iter().cloned().collect(),
        None => phrase.candidates(),
    }
    .into_iter()
    .filter(|id| scope.contains(id))
    .collect();

    let mut narrowed = narrow(world, ctx.actor, in_scope, prefer, favor).into_iter();
    match (narrowed.next(), narrowed.next()) {
        (Some(id), None) => Ok(id),
        (first, second) => Err(first.into_iter().chain(second).chain(narrowed).collect()),
    }
}

/// Apply the tie-break filters; each only applies if something survives it.
pub(crate) fn narrow(
    world: &World,
    actor: &EntityId,
    candidates: BTreeSet<EntityId>,
    prefer: Option<Flag>,
    favor: Locality,
) -> BTreeSet<EntityId> {
    if candidates.len() <= 1 {
        return candidates;
    }
    let mut current = candidates;

    if let Some(flag) = prefer {
        let flagged: BTreeSet<EntityId> = current
            .iter()
            .filter(|id| world.flag(id, flag))
            .cloned()
            .collect();
        if !flagged.is_empty() {
            current = flagged;
        }
    }
    if current.len() <= 1 {
        return current;
    }

    let held: BTreeSet<EntityId> = current
        .iter()
        .filter(|id| world.is_within(id, actor))
        .cloned()
        .collect();
    let preferred: BTreeSet<EntityId> = match favor {
        Locality::Held => held,
        Locality::Room => current.difference(&held).cloned().collect(),
    };
    if !preferred.is_empty() {
        current = preferred;
    }
    current
}

/// Build the failure for a phrase that did not resolve to exactly one entity.
pub(crate) fn unresolved(
    world: &World,
    phrase: &NounPhrase,
    candidates: Vec<EntityId>,
    pending: impl FnOnce() -> Pending,
    ctx: &ResolveContext<'_>,
) -> ParseFailure {
    if candidates.is_empty() {
        if let Some(pronoun) = &phrase.pronoun {
            return match ctx.last_referent.and_then(|id| world.get(id)) {
                Some(entity) => ParseFailure::NotHere {
                    phrase: entity.name.clone(),
                },
                None => ParseFailure::UnknownReference {
                    pronoun: pronoun.clone(),
                },
            };
        }
        return ParseFailure::NotHere {
            phrase: phrase.text(),
        };
    }
    ambiguous(world, candidates, pending())
}

pub(crate) fn ambiguous(world: &World, candidates: Vec<EntityId>, pending: Pending) -> ParseFailure {
    let names = candidates
        .iter()
        .map(|id| {
            world
                .get(id)
                .map(|e| e.definite_name())
                .unwrap_or_else(|| id.to_string())
        })
        .collect();
    ParseFailure::Ambiguous(Box::new(Ambiguity {
        candidates,
        names,
        pending,
    }))
}

/// The closest vocabulary word to `word`, if it is close enough.
pub fn suggest_word(vocabulary: &Vocabulary, word: &str) -> Option<String> {
    let word = word.to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for known in vocabulary.words() {
        if known.contains(' ') {
            continue;
        }
        let score = jaro_winkler(&word, known);
        let better = best.is_none_or(|(_, s)| score > s);
        if score >= SUGGESTION_THRESHOLD && better {
            best = Some((known, score));
        }
    }
    best.map(|(w, _)| w.to_string())
}
