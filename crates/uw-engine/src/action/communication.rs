use uw_core::{Entity, EntityId, EntityKind, Flag, PropertyValue};
use uw_parser::Command;

use super::{
    ActionContext, ActionHandler, EVIDENCE_COLLECTED, Outcome, collect_evidence, direct, indirect,
    target, the,
};
use crate::error::{EngineResult, Refusal};

/// Reason recorded when the right suspect is accused with every clue in hand.
pub const SOLVED: &str = "solved";
/// Reason recorded when the accused is not the culprit.
pub const WRONG_ACCUSATION: &str = "wrong_accusation";
/// Reason recorded when the culprit is named without the required evidence.
pub const INSUFFICIENT_EVIDENCE: &str = "insufficient_evidence";

/// The character in `slot`, refusing yourself and anything that is not a
/// character.
fn conversant<'w>(ctx: &'w ActionContext<'_>, slot: Option<&EntityId>) -> Result<&'w Entity, Refusal> {
    let entity = target(ctx.world, slot)?;
    if entity.id == ctx.actor {
        return Err(Refusal::new("Talking to yourself won't help."));
    }
    if entity.kind != EntityKind::Character {
        return Err(Refusal::new(format!(
            "You can't talk to {}.",
            entity.definite_name()
        )));
    }
    Ok(entity)
}

/// Whether `key` answers `topic`: equal, or every word of the key appears in
/// the topic.
fn topic_matches(key: &str, topic: &str) -> bool {
    let key = key.to_lowercase();
    if key == topic {
        return true;
    }
    let words: Vec<&str> = topic.split_whitespace().collect();
    let mut wanted = key.split_whitespace().peekable();
    wanted.peek().is_some() && wanted.all(|w| words.contains(&w))
}

/// First entry of a string-keyed map whose key answers `topic`.
fn lookup<'m, V>(
    entries: impl IntoIterator<Item = (&'m String, V)>,
    topic: &str,
) -> Option<(&'m String, V)> {
    entries.into_iter().find(|(key, _)| topic_matches(key, topic))
}

/// A map-valued property of `entity`, if it has one.
fn map_property<'e>(
    entity: &'e Entity,
    key: &str,
) -> Option<&'e std::collections::BTreeMap<String, PropertyValue>> {
    entity.property(key).and_then(PropertyValue::as_map)
}

fn quote(speaker: &Entity, reply: &str) -> String {
    format!("{} says, \"{reply}\"", the(speaker))
}

fn topic(cmd: &Command) -> String {
    cmd.text
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// `talk to OBJ`: the character's `greeting`.
#[derive(Debug, Clone, Copy)]
pub struct Talk;

impl ActionHandler for Talk {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        conversant(ctx, cmd.direct.as_ref()).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let character = ctx.entity(direct(cmd)?)?;
        let line = match character.text_property("greeting") {
            Some(greeting) => quote(character, greeting),
            None => format!("{} nods at you.", the(character)),
        };
        Ok(Outcome::say(line).taking(ctx.action_minutes()))
    }
}

/// `ask OBJ about TEXT`.
///
/// Replies come from dialogue topics, then knowledge, then the character's
/// `default_reply`. A topic listed in the character's `evidence_topics` map
/// marks the named clue collected.
#[derive(Debug, Clone, Copy)]
pub struct Ask;

impl ActionHandler for Ask {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let character = conversant(ctx, cmd.direct.as_ref())?;
        if topic(cmd).is_empty() {
            return Err(Refusal::new(format!(
                "What do you want to ask {} about?",
                character.definite_name()
            )));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let topic = topic(cmd);
        let character = ctx.entity(direct(cmd)?)?;

        let dialogue = character.components.character.as_ref();
        let reply = dialogue
            .and_then(|c| lookup(&c.topics, &topic).map(|(_, reply)| reply.clone()))
            .or_else(|| {
                dialogue.and_then(|c| lookup(&c.knowledge, &topic).map(|(_, fact)| fact.to_string()))
            })
            .or_else(|| character.text_property("default_reply").map(str::to_string));
        let line = match reply {
            Some(reply) => quote(character, &reply),
            None => format!("{} has nothing to say about that.", the(character)),
        };
        let clue = map_property(character, "evidence_topics")
            .and_then(|topics| lookup(topics, &topic))
            .and_then(|(_, clue)| clue.as_str())
            .map(EntityId::new);

        let mut outcome = Outcome::say(line).taking(ctx.action_minutes());
        if let Some(clue) = clue {
            if collect_evidence(ctx.world, &clue)? {
                outcome = outcome
                    .and_say("You make a note of this testimony.")
                    .signal(EVIDENCE_COLLECTED);
            }
        }
        Ok(outcome)
    }
}

/// `tell OBJ about TEXT`: reactions from the `tell_topics` map.
#[derive(Debug, Clone, Copy)]
pub struct Tell;

impl ActionHandler for Tell {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        conversant(ctx, cmd.direct.as_ref()).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let topic = topic(cmd);
        let character = ctx.entity(direct(cmd)?)?;
        let line = map_property(character, "tell_topics")
            .and_then(|reactions| lookup(reactions, &topic))
            .map(|(_, reaction)| reaction.to_string())
            .unwrap_or_else(|| format!("{} listens, but says nothing.", the(character)));
        Ok(Outcome::say(line).taking(ctx.action_minutes()))
    }
}

/// `show OBJ to OBJ`: reactions from the character's `show_replies` map,
/// keyed by item id.
#[derive(Debug, Clone, Copy)]
pub struct Show;

impl ActionHandler for Show {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let item = target(ctx.world, cmd.direct.as_ref())?;
        if !ctx.holds(&item.id) {
            return Err(Refusal::new("You need to be carrying it first."));
        }
        conversant(ctx, cmd.indirect.as_ref()).map(|_| ())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let item = ctx.entity(direct(cmd)?)?;
        let character = ctx.entity(indirect(cmd)?)?;
        let reply = map_property(character, "show_replies")
            .and_then(|replies| replies.get(item.id.as_str()))
            .map(ToString::to_string);
        let line = match reply {
            Some(reply) => reply,
            None if item.has_flag(Flag::Evidence) => format!(
                "{} examines {} carefully.",
                the(character),
                item.definite_name()
            ),
            None => format!(
                "{} glances at {} but shows no interest.",
                the(character),
                item.definite_name()
            ),
        };
        Ok(Outcome::say(line).taking(ctx.action_minutes()))
    }
}

/// `accuse OBJ`: judged against the configured solution. Always ends the
/// game once a solution exists.
#[derive(Debug, Clone, Copy)]
pub struct Accuse;

impl ActionHandler for Accuse {
    fn can_execute(&self, cmd: &Command, ctx: &ActionContext<'_>) -> Result<(), Refusal> {
        let accused = target(ctx.world, cmd.direct.as_ref())?;
        if accused.kind != EntityKind::Character {
            return Err(Refusal::new("You can only accuse people."));
        }
        if ctx.config.solution.is_none() {
            return Err(Refusal::new("There is nothing to accuse anyone of."));
        }
        Ok(())
    }

    fn execute(&self, cmd: &Command, ctx: &mut ActionContext<'_>) -> EngineResult<Outcome> {
        let accused = ctx.entity(direct(cmd)?)?;
        let Some(solution) = ctx.config.solution.as_ref() else {
            return Ok(Outcome::say("There is nothing to accuse anyone of."));
        };
        let name = accused.definite_name();
        let (reason, line) = if accused.id != solution.culprit {
            (
                WRONG_ACCUSATION,
                format!("Your accusation against {name} is incorrect. The case remains unsolved."),
            )
        } else if solution
            .required_evidence
            .iter()
            .any(|clue| !ctx.world.flag(clue, Flag::Collected))
        {
            (
                INSUFFICIENT_EVIDENCE,
                "You've identified the right person, but you don't have enough evidence to convict."
                    .to_string(),
            )
        } else {
            (
                SOLVED,
                format!("You've correctly identified {name} as the culprit, and the evidence holds. The case is closed."),
            )
        };
        let mut outcome = Outcome::say(line).taking(ctx.action_minutes());
        outcome.game_over = Some(reason.to_string());
        Ok(outcome)
    }
}
