//! The command interpreter: tokenize, tag, match grammar, resolve references.

use std::collections::BTreeSet;

use tracing::debug;
use uw_core::{Direction, EntityId, Flag, World};

use crate::command::Command;
use crate::error::{ParseFailure, ParseResult};
use crate::grammar::{Grammar, GrammarRule, Locality, PatternElement};
use crate::lexer::{Token, lex};
use crate::resolver::{
    Ambiguity, NounPhrase, Pending, ResolveContext, Slot, ambiguous, resolve_phrase,
    suggest_word, unresolved,
};
use crate::vocabulary::{ARTICLES, PRONOUNS, Sense, Target, Vocabulary, WordRole};

/// A token after vocabulary lookup.
#[derive(Debug, Clone)]
struct Tagged {
    word: String,
    tag: Tag,
}

#[derive(Debug, Clone)]
enum Tag {
    Known(Vec<Sense>),
    Number(i64),
    Pronoun,
    Article,
    Unknown,
}

impl Tagged {
    fn senses(&self) -> &[Sense] {
        match &self.tag {
            Tag::Known(senses) => senses,
            _ => &[],
        }
    }

    fn is_verb(&self, verb: &str) -> bool {
        self.senses().iter().any(|s| {
            s.role == WordRole::Verb && s.targets.contains(&Target::Verb(verb.to_string()))
        })
    }

    fn verb_ids(&self) -> impl Iterator<Item = &str> {
        self.senses()
            .iter()
            .filter(|s| s.role == WordRole::Verb)
            .flat_map(|s| s.targets.iter())
            .filter_map(|t| match t {
                Target::Verb(v) => Some(v.as_str()),
                _ => None,
            })
    }

    fn direction(&self) -> Option<Direction> {
        self.senses()
            .iter()
            .filter(|s| s.role == WordRole::Direction)
            .flat_map(|s| s.targets.iter())
            .find_map(|t| match t {
                Target::Direction(d) => Some(*d),
                _ => None,
            })
    }

    /// Entities this word can denote as a noun or adjective, or `None` if
    /// it cannot be part of a noun phrase.
    fn entities(&self) -> Option<BTreeSet<EntityId>> {
        let mut found = false;
        let mut ids = BTreeSet::new();
        for sense in self.senses() {
            if matches!(sense.role, WordRole::Noun | WordRole::Adjective) {
                found = true;
                ids.extend(sense.targets.iter().filter_map(|t| match t {
                    Target::Entity(id) => Some(id.clone()),
                    _ => None,
                }));
            }
        }
        found.then_some(ids)
    }
}

/// Slot values gathered while matching one rule.
#[derive(Debug, Clone, Default)]
struct Captures {
    objects: Vec<NounPhrase>,
    preposition: Option<String>,
    direction: Option<Direction>,
    text: Option<String>,
    number: Option<i64>,
}

/// Turns raw input lines into resolved [`Command`]s.
///
/// Stateless across turns: the caller supplies the actor and the last
/// referent through [`ResolveContext`].
#[derive(Debug, Clone)]
pub struct Interpreter {
    vocabulary: Vocabulary,
    grammar: Grammar,
}

impl Interpreter {
    /// Build an interpreter from a loaded vocabulary and grammar.
    pub fn new(vocabulary: Vocabulary, grammar: Grammar) -> Self {
        Self {
            vocabulary,
            grammar,
        }
    }

    /// The built-in English vocabulary and grammar, with no nouns.
    pub fn standard() -> Self {
        Self::new(Vocabulary::standard(), Grammar::standard())
    }

    /// The vocabulary in use.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The grammar in use.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Interpret one line of input.
    pub fn interpret(
        &self,
        input: &str,
        world: &World,
        ctx: &ResolveContext<'_>,
    ) -> ParseResult<Command> {
        let tokens = lex(input);
        if tokens.is_empty() {
            return Err(ParseFailure::Empty);
        }
        let tagged: Vec<Tagged> = self
            .tag(&tokens)
            .into_iter()
            .filter(|t| !matches!(t.tag, Tag::Article))
            .collect();
        if tagged.is_empty() {
            return Err(ParseFailure::NotUnderstood);
        }

        for rule in self.grammar.rules() {
            if let Some(captures) = match_pattern(&rule.pattern, &tagged, &Captures::default()) {
                let command = self.build(rule, captures, input, world, ctx)?;
                debug!(input = input.trim(), action = %command.action, "interpreted command");
                return Ok(command);
            }
        }

        Err(self.diagnose(&tagged))
    }

    /// Finish an ambiguous command from a clarifying noun phrase such as
    /// "brass" or "the silver one".
    pub fn disambiguate(
        &self,
        world: &World,
        ctx: &ResolveContext<'_>,
        ambiguity: &Ambiguity,
        reply: &str,
    ) -> ParseResult<Command> {
        let tokens = lex(reply);
        let tagged: Vec<Tagged> = self
            .tag(&tokens)
            .into_iter()
            .filter(|t| !matches!(t.tag, Tag::Article) && t.word != "one")
            .collect();
        if tagged.is_empty() {
            return Err(ParseFailure::Empty);
        }
        if let Some(unknown) = tagged.iter().find(|t| matches!(t.tag, Tag::Unknown)) {
            return Err(ParseFailure::UnknownWord {
                word: unknown.word.clone(),
                suggestion: suggest_word(&self.vocabulary, &unknown.word),
            });
        }
        let phrase = noun_phrase(&tagged).ok_or(ParseFailure::NotUnderstood)?;

        let offered: BTreeSet<EntityId> = ambiguity.candidates.iter().cloned().collect();
        let matching: Vec<EntityId> = offered.intersection(&phrase.candidates()).cloned().collect();
        let pending = &ambiguity.pending;
        match matching.as_slice() {
            [] => Err(ParseFailure::NotHere {
                phrase: phrase.text(),
            }),
            [chosen] => {
                let mut command = pending.command.clone();
                fill(&mut command, pending.slot, chosen.clone());
                resolve_all(
                    world,
                    ctx,
                    command,
                    pending.remaining.clone(),
                    pending.prefer,
                    pending.favor,
                )
            }
            _ => Err(ambiguous(world, matching, pending.clone())),
        }
    }

    fn build(
        &self,
        rule: &GrammarRule,
        captures: Captures,
        input: &str,
        world: &World,
        ctx: &ResolveContext<'_>,
    ) -> ParseResult<Command> {
        let mut command = Command::new(rule.action.clone());
        command.verb = rule.verb().map(str::to_string);
        command.preposition = captures.preposition;
        command.direction = captures.direction;
        command.text = captures.text;
        command.number = captures.number;
        command.precondition = rule.precondition.clone();
        command.raw = input.trim().to_string();

        let slots = [Slot::Direct, Slot::Indirect];
        let phrases: Vec<(Slot, NounPhrase)> = slots.into_iter().zip(captures.objects).collect();
        resolve_all(world, ctx, command, phrases, rule.prefer, rule.favor)
    }

    fn diagnose(&self, tagged: &[Tagged]) -> ParseFailure {
        if let Some(unknown) = tagged.iter().find(|t| matches!(t.tag, Tag::Unknown)) {
            return ParseFailure::UnknownWord {
                word: unknown.word.clone(),
                suggestion: suggest_word(&self.vocabulary, &unknown.word),
            };
        }
        if let [only] = tagged {
            let wants_object = only.verb_ids().any(|verb| {
                self.grammar
                    .rules()
                    .iter()
                    .any(|r| r.verb() == Some(verb) && r.takes_object())
            });
            if wants_object {
                return ParseFailure::Incomplete {
                    verb: only.word.clone(),
                };
            }
        }
        ParseFailure::NotUnderstood
    }

    fn tag(&self, tokens: &[Token]) -> Vec<Tagged> {
        let mut out = Vec::new();
        let mut i = 0;
        'outer: while i < tokens.len() {
            let longest = self.vocabulary.max_phrase_len().min(tokens.len() - i);
            for n in (2..=longest).rev() {
                let phrase = tokens[i..i + n]
                    .iter()
                    .map(Token::text)
                    .collect::<Vec<_>>()
                    .join(" ");
                if self.vocabulary.contains_phrase(&phrase) {
                    let senses = self.vocabulary.lookup(&phrase).to_vec();
                    out.push(Tagged {
                        word: phrase,
                        tag: Tag::Known(senses),
                    });
                    i += n;
                    continue 'outer;
                }
            }
            match &tokens[i] {
                Token::Number(n) => out.push(Tagged {
                    word: n.to_string(),
                    tag: Tag::Number(*n),
                }),
                Token::Word(word) => self.tag_word(word, &mut out),
            }
            i += 1;
        }
        out
    }

    fn tag_word(&self, word: &str, out: &mut Vec<Tagged>) {
        let tag = if ARTICLES.contains(&word) {
            Tag::Article
        } else if PRONOUNS.contains(&word) {
            Tag::Pronoun
        } else {
            let senses = self.vocabulary.lookup(word);
            if !senses.is_empty() {
                Tag::Known(senses.to_vec())
            } else if word.contains('-') {
                for part in word.split('-').filter(|p| !p.is_empty()) {
                    self.tag_word(part, out);
                }
                return;
            } else if word.contains('\'') {
                self.tag_word(&word.replace('\'', ""), out);
                return;
            } else {
                Tag::Unknown
            }
        };
        out.push(Tagged {
            word: word.to_string(),
            tag,
        });
    }
}

/// Match `pattern` against the whole of `tokens`, backtracking over noun
/// phrase lengths.
fn match_pattern(
    pattern: &[PatternElement],
    tokens: &[Tagged],
    caps: &Captures,
) -> Option<Captures> {
    let Some((element, rest)) = pattern.split_first() else {
        return tokens.is_empty().then(|| caps.clone());
    };

    if let PatternElement::Object = element {
        for len in (1..=tokens.len()).rev() {
            if let Some(phrase) = noun_phrase(&tokens[..len]) {
                let mut next = caps.clone();
                next.objects.push(phrase);
                if let Some(done) = match_pattern(rest, &tokens[len..], &next) {
                    return Some(done);
                }
            }
        }
        return None;
    }

    let (token, tail) = tokens.split_first()?;
    let mut next = caps.clone();
    match element {
        PatternElement::Verb(verb) => {
            if !token.is_verb(verb) {
                return None;
            }
        }
        PatternElement::Literal(words) => {
            if !words.contains(&token.word) {
                return None;
            }
            next.preposition.get_or_insert_with(|| token.word.clone());
        }
        PatternElement::Direction => next.direction = Some(token.direction()?),
        PatternElement::Number => match token.tag {
            Tag::Number(n) => next.number = Some(n),
            _ => return None,
        },
        PatternElement::Text => {
            let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
            next.text = Some(words.join(" "));
            return match_pattern(rest, &[], &next);
        }
        PatternElement::Object => return None,
    }
    match_pattern(rest, tail, &next)
}

/// A run of noun/adjective words, or a lone pronoun.
fn noun_phrase(tokens: &[Tagged]) -> Option<NounPhrase> {
    if let [only] = tokens {
        if matches!(only.tag, Tag::Pronoun) {
            return Some(NounPhrase {
                words: vec![only.word.clone()],
                constraints: Vec::new(),
                pronoun: Some(only.word.clone()),
            });
        }
    }
    let constraints = tokens
        .iter()
        .map(Tagged::entities)
        .collect::<Option<Vec<_>>>()?;
    if constraints.is_empty() {
        return None;
    }
    Some(NounPhrase {
        words: tokens.iter().map(|t| t.word.clone()).collect(),
        constraints,
        pronoun: None,
    })
}

fn fill(command: &mut Command, slot: Slot, id: EntityId) {
    match slot {
        Slot::Direct => command.direct = Some(id),
        Slot::Indirect => command.indirect = Some(id),
    }
}

/// Resolve each pending phrase in order, stopping at the first failure.
fn resolve_all(
    world: &World,
    ctx: &ResolveContext<'_>,
    mut command: Command,
    phrases: Vec<(Slot, NounPhrase)>,
    prefer: Option<Flag>,
    favor: Locality,
) -> ParseResult<Command> {
    for (i, (slot, phrase)) in phrases.iter().enumerate() {
        let (slot_prefer, slot_favor) = match slot {
            Slot::Direct => (prefer, favor),
            Slot::Indirect => (None, Locality::Room),
        };
        match resolve_phrase(world, ctx, phrase, slot_prefer, slot_favor) {
            Ok(id) => fill(&mut command, *slot, id),
            Err(candidates) => {
                let failure = unresolved(
                    world,
                    phrase,
                    candidates,
                    || Pending {
                        command: command.clone(),
                        slot: *slot,
                        remaining: phrases[i + 1..].to_vec(),
                        prefer,
                        favor,
                    },
                    ctx,
                );
                return Err(failure);
            }
        }
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uw_core::{Entity, EntityKind, LocationComponent, WorldMeta};

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    /// Hall (north to study) with a brass key, a silver key, a closed chest
    /// holding a coin, and a butler.
    fn fixture() -> (World, Interpreter) {
        let mut world = World::new(WorldMeta::new("Fixture"));
        let mut hall = Entity::new("hall", EntityKind::Location, "Hall");
        hall.components.location =
            Some(LocationComponent::default().with_exit(Direction::North, "study"));
        world.add_entity(hall).unwrap();
        world
            .add_entity(Entity::new("study", EntityKind::Location, "Study"))
            .unwrap();
        world
            .add_entity(Entity::new("player", EntityKind::Player, "yourself"))
            .unwrap();
        world
            .add_entity(Entity::new("brass_key", EntityKind::Item, "brass key").with_flag(Flag::Portable))
            .unwrap();
        world
            .add_entity(Entity::new("silver_key", EntityKind::Item, "silver key").with_flag(Flag::Portable))
            .unwrap();
        world
            .add_entity(
                Entity::new("chest", EntityKind::Item, "oak chest")
                    .with_flag(Flag::Container)
                    .with_flag(Flag::Openable),
            )
            .unwrap();
        world
            .add_entity(Entity::new("coin", EntityKind::Item, "gold coin").with_flag(Flag::Portable))
            .unwrap();
        world
            .add_entity(Entity::new("butler", EntityKind::Character, "Mr. Dunbar"))
            .unwrap();
        for (what, wher) in [
            ("player", "hall"),
            ("brass_key", "hall"),
            ("silver_key", "hall"),
            ("chest", "hall"),
            ("coin", "chest"),
            ("butler", "hall"),
        ] {
            world.place(&id(what), &id(wher)).unwrap();
        }

        let mut vocab = Vocabulary::standard();
        vocab.add_noun("key", &id("brass_key"));
        vocab.add_noun("key", &id("silver_key"));
        vocab.add_adjective("brass", &id("brass_key"));
        vocab.add_adjective("silver", &id("silver_key"));
        vocab.add_noun("chest", &id("chest"));
        vocab.add_adjective("oak", &id("chest"));
        vocab.add_noun("coin", &id("coin"));
        vocab.add_adjective("gold", &id("coin"));
        vocab.add_noun("dunbar", &id("butler"));
        vocab.add_noun("butler", &id("butler"));
        vocab.add_noun("well-worn rug", &id("chest"));

        (world, Interpreter::new(vocab, Grammar::standard()))
    }

    fn run(interp: &Interpreter, world: &World, input: &str) -> ParseResult<Command> {
        let actor = id("player");
        interp.interpret(input, world, &ResolveContext::new(&actor))
    }

    #[test]
    fn verb_only_command() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "inventory").unwrap();
        assert_eq!(cmd.action, "inventory");
        assert_eq!(cmd.direct, None);
        assert_eq!(run(&interp, &world, "i").unwrap().action, "inventory");
    }

    #[test]
    fn bare_direction_and_go() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "n").unwrap();
        assert_eq!(cmd.action, "go");
        assert_eq!(cmd.direction, Some(Direction::North));
        let cmd = run(&interp, &world, "go north").unwrap();
        assert_eq!(cmd.direction, Some(Direction::North));
    }

    #[test]
    fn ambiguous_key_then_adjective_resolves() {
        let (world, interp) = fixture();
        let err = run(&interp, &world, "take key").unwrap_err();
        let ParseFailure::Ambiguous(ambiguity) = &err else {
            panic!("expected ambiguity, got {err:?}");
        };
        assert_eq!(ambiguity.candidates, vec![id("brass_key"), id("silver_key")]);
        assert_eq!(
            err.to_string(),
            "Which do you mean, the brass key or the silver key?"
        );

        let cmd = run(&interp, &world, "take brass key").unwrap();
        assert_eq!(cmd.direct, Some(id("brass_key")));
        assert_eq!(cmd.action, "take");
    }

    #[test]
    fn same_turn_disambiguation() {
        let (world, interp) = fixture();
        let actor = id("player");
        let ctx = ResolveContext::new(&actor);
        let Err(ParseFailure::Ambiguous(ambiguity)) = interp.interpret("get key", &world, &ctx) else {
            panic!("expected ambiguity");
        };
        let cmd = interp.disambiguate(&world, &ctx, &ambiguity, "the silver one").unwrap();
        assert_eq!(cmd.direct, Some(id("silver_key")));
        assert_eq!(cmd.action, "take");

        let err = interp.disambiguate(&world, &ctx, &ambiguity, "gold").unwrap_err();
        assert!(matches!(err, ParseFailure::NotHere { .. }));
    }

    #[test]
    fn closed_container_hides_candidates_until_opened() {
        let (mut world, interp) = fixture();
        let err = run(&interp, &world, "take coin").unwrap_err();
        assert_eq!(
            err,
            ParseFailure::NotHere {
                phrase: "coin".into()
            }
        );
        world.set_flag(&id("chest"), Flag::Open).unwrap();
        let cmd = run(&interp, &world, "take coin").unwrap();
        assert_eq!(cmd.direct, Some(id("coin")));
    }

    #[test]
    fn two_object_pattern() {
        let (mut world, interp) = fixture();
        world.move_entity(&id("coin"), Some(&id("player"))).unwrap();
        let cmd = run(&interp, &world, "put the gold coin into the oak chest").unwrap();
        assert_eq!(cmd.action, "put_in");
        assert_eq!(cmd.direct, Some(id("coin")));
        assert_eq!(cmd.indirect, Some(id("chest")));
        assert_eq!(cmd.preposition.as_deref(), Some("into"));
        assert_eq!(cmd.precondition.as_deref(), Some("holding_direct"));
    }

    #[test]
    fn multi_word_verbs_match_greedily() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "pick up brass key").unwrap();
        assert_eq!(cmd.action, "take");
        let cmd = run(&interp, &world, "look at the chest").unwrap();
        assert_eq!(cmd.action, "examine");
        assert_eq!(cmd.direct, Some(id("chest")));
    }

    #[test]
    fn text_slot_takes_the_rest() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "ask butler about the missing will").unwrap();
        assert_eq!(cmd.action, "ask");
        assert_eq!(cmd.direct, Some(id("butler")));
        assert_eq!(cmd.text.as_deref(), Some("missing will"));
    }

    #[test]
    fn number_slot() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "wait 30 minutes").unwrap();
        assert_eq!(cmd.action, "wait");
        assert_eq!(cmd.number, Some(30));
        assert_eq!(run(&interp, &world, "z").unwrap().number, None);
    }

    #[test]
    fn pronoun_uses_last_referent() {
        let (world, interp) = fixture();
        let actor = id("player");
        let brass = id("brass_key");
        let ctx = ResolveContext::new(&actor).with_referent(Some(&brass));
        let cmd = interp.interpret("take it", &world, &ctx).unwrap();
        assert_eq!(cmd.direct, Some(brass.clone()));

        let err = run(&interp, &world, "take it").unwrap_err();
        assert_eq!(
            err,
            ParseFailure::UnknownReference {
                pronoun: "it".into()
            }
        );
    }

    #[test]
    fn unknown_word_versus_bad_structure() {
        let (world, interp) = fixture();
        let err = run(&interp, &world, "frobnicate the chest").unwrap_err();
        assert!(matches!(err, ParseFailure::UnknownWord { ref word, .. } if word == "frobnicate"));

        let err = run(&interp, &world, "chest open north").unwrap_err();
        assert_eq!(err, ParseFailure::NotUnderstood);

        let err = run(&interp, &world, "examin chest").unwrap_err();
        assert_eq!(
            err,
            ParseFailure::UnknownWord {
                word: "examin".into(),
                suggestion: Some("examine".into())
            }
        );
    }

    #[test]
    fn lone_transitive_verb_asks_for_object() {
        let (world, interp) = fixture();
        assert_eq!(
            run(&interp, &world, "take").unwrap_err(),
            ParseFailure::Incomplete {
                verb: "take".into()
            }
        );
    }

    #[test]
    fn empty_and_article_only_input() {
        let (world, interp) = fixture();
        assert_eq!(run(&interp, &world, "   ").unwrap_err(), ParseFailure::Empty);
        assert_eq!(run(&interp, &world, "the").unwrap_err(), ParseFailure::NotUnderstood);
    }

    #[test]
    fn plurals_and_hyphenated_entries() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "examine well-worn rug").unwrap();
        assert_eq!(cmd.direct, Some(id("chest")));
        let err = run(&interp, &world, "take keys").unwrap_err();
        assert!(matches!(err, ParseFailure::Ambiguous(_)));
    }

    #[test]
    fn people_prefer_the_person_flag() {
        let (world, interp) = fixture();
        let cmd = run(&interp, &world, "talk to dunbar").unwrap();
        assert_eq!(cmd.action, "talk");
        assert_eq!(cmd.direct, Some(id("butler")));
    }
}
