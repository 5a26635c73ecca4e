//! Static content and world loading.
//!
//! Content is a JSON document describing entities, extra vocabulary, grammar
//! rules, timed events and engine settings. [`load_world`] turns it into a
//! validated world, an interpreter and a primed scheduler in two passes:
//! first every entity is created, then placements are resolved once all ids
//! are known.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;
use uw_core::{
    CharacterComponent, Direction, Entity, EntityId, EntityKind, Flag, LocationComponent,
    PropertyValue, ScheduleEntry, World, WorldMeta,
};
use uw_parser::lexer::{Token, lex};
use uw_parser::{Grammar, GrammarRule, Interpreter, Target, Vocabulary, WordRole};
use uw_scheduler::{EventAction, Scheduler, install_schedules};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Words that refer to the player.
const SELF_WORDS: [&str; 3] = ["me", "myself", "self"];

/// A complete story definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    /// Story title.
    pub title: String,
    /// Author credit.
    pub author: Option<String>,
    /// Text shown before the first turn.
    pub intro: Option<String>,
    /// Engine settings.
    pub config: EngineConfig,
    /// Every entity in the story.
    pub entities: Vec<EntityDef>,
    /// Extra verb synonyms: verb id to words.
    pub verbs: BTreeMap<String, Vec<String>>,
    /// Extra vocabulary entries.
    pub words: Vec<WordDef>,
    /// Grammar rules tried before the built-in ones.
    pub grammar: Vec<RuleDef>,
    /// One-shot events at absolute minutes.
    pub events: Vec<EventDef>,
    /// Recurring daemons.
    pub daemons: Vec<EventAction>,
}

impl Content {
    /// Parse content from JSON text.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// One entity as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Stable id.
    pub id: EntityId,
    /// What sort of thing it is.
    pub kind: EntityKind,
    /// Display name. Its last word becomes a noun, earlier words adjectives.
    pub name: String,
    /// One-line description used in room listings.
    #[serde(default)]
    pub short: Option<String>,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Initial flags.
    #[serde(default)]
    pub flags: BTreeSet<Flag>,
    /// Initial properties.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Initial holder.
    #[serde(default)]
    pub location: Option<EntityId>,
    /// Exits, for locations.
    #[serde(default)]
    pub exits: BTreeMap<Direction, EntityId>,
    /// Extra nouns.
    #[serde(default)]
    pub nouns: Vec<String>,
    /// Extra adjectives.
    #[serde(default)]
    pub adjectives: Vec<String>,
    /// Dialogue topics, for characters.
    #[serde(default)]
    pub topics: BTreeMap<String, String>,
    /// Free-form knowledge, for characters.
    #[serde(default)]
    pub knowledge: BTreeMap<String, PropertyValue>,
    /// Time-stamped intents, for characters.
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    /// Per-action override hooks.
    #[serde(default)]
    pub hooks: BTreeMap<String, String>,
    /// Locations are lit unless marked dark.
    #[serde(default)]
    pub dark: bool,
}

/// An extra vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordDef {
    /// The word or phrase.
    pub word: String,
    /// Its role.
    pub role: WordRole,
    /// Verb id, entity id or direction name, depending on the role.
    #[serde(default)]
    pub target: Option<String>,
}

/// An authored grammar rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    /// Pattern such as `"pull OBJ"`.
    pub pattern: String,
    /// Action id to dispatch to.
    pub action: String,
    /// Precondition id.
    #[serde(default)]
    pub precondition: Option<String>,
    /// Flag preferred when the direct object is ambiguous.
    #[serde(default)]
    pub prefer: Option<Flag>,
    /// Prefer held objects when ambiguous.
    #[serde(default)]
    pub favor_held: bool,
}

/// A one-shot event at an absolute minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    /// Fire time.
    pub at: i64,
    /// Tie-break; lower fires first.
    #[serde(default)]
    pub priority: i32,
    /// Handler and arguments.
    #[serde(flatten)]
    pub action: EventAction,
}

/// Everything [`load_world`] builds.
#[derive(Debug)]
pub struct LoadedWorld {
    /// The validated world.
    pub world: World,
    /// Interpreter with the story's vocabulary and grammar.
    pub interpreter: Interpreter,
    /// Scheduler with content events, NPC schedules and the time limit.
    pub scheduler: Scheduler,
    /// Settings from the content.
    pub config: EngineConfig,
}

/// Build and validate everything the story needs.
pub fn load_world(content: &Content) -> EngineResult<LoadedWorld> {
    let config = content.config.clone();
    let mut world = build_world(content)?;
    let interpreter = build_interpreter(content, &world)?;
    let mut scheduler = Scheduler::new(config.start_minute);

    let followers = install_schedules(&mut scheduler, &mut world)?;
    for event in &content.events {
        scheduler.schedule_at(event.at, event.action.clone(), event.priority)?;
    }
    for daemon in &content.daemons {
        scheduler.schedule_recurring(daemon.clone())?;
    }
    if let Some(deadline) = config.deadline() {
        let mut action = EventAction::new("time_limit").with_arg("deadline", deadline);
        if let (Some(at), Some(text)) = (config.warning_at, config.warning.as_ref()) {
            action = action
                .with_arg("warning_at", config.start_minute + at)
                .with_arg("warning", text.as_str());
        }
        scheduler.schedule_recurring(action)?;
    }

    info!(
        title = %world.meta.title,
        entities = world.entity_count(),
        words = interpreter.vocabulary().len(),
        rules = interpreter.grammar().len(),
        events = scheduler.pending().count(),
        daemons = scheduler.daemons().len(),
        followers,
        "world loaded"
    );

    Ok(LoadedWorld {
        world,
        interpreter,
        scheduler,
        config,
    })
}

fn build_world(content: &Content) -> EngineResult<World> {
    let mut meta = WorldMeta::new(content.title.as_str());
    meta.author = content.author.clone();
    meta.intro = content.intro.clone();
    let mut world = World::new(meta);

    // Pass 1: create entities
    for def in &content.entities {
        world.add_entity(entity_from_def(def))?;
    }

    // Pass 2: placements, now that every id exists
    for def in &content.entities {
        if let Some(location) = &def.location {
            if !world.contains(location) {
                return Err(EngineError::Content(format!(
                    "{} is placed in unknown entity {location}",
                    def.id
                )));
            }
            world.place(&def.id, location)?;
        }
    }

    world.validate()?;
    Ok(world)
}

fn entity_from_def(def: &EntityDef) -> Entity {
    let mut entity = Entity::new(def.id.clone(), def.kind, def.name.as_str())
        .with_description(def.description.as_str());
    entity.short_description = def.short.clone();
    entity.flags.extend(def.flags.iter().copied());
    entity.properties = def.properties.clone();
    entity.hooks = def.hooks.clone();

    match def.kind {
        EntityKind::Location => {
            entity.components.location = Some(LocationComponent {
                exits: def.exits.clone(),
            });
            if !def.dark {
                entity.set_flag(Flag::Lit);
            }
        }
        EntityKind::Character => {
            let mut schedule = def.schedule.clone();
            schedule.sort_by_key(|entry| entry.at);
            entity.components.character = Some(CharacterComponent {
                topics: def.topics.clone(),
                knowledge: def.knowledge.clone(),
                schedule,
            });
        }
        EntityKind::Item | EntityKind::Player => {}
    }
    entity
}

fn build_interpreter(content: &Content, world: &World) -> EngineResult<Interpreter> {
    let mut vocabulary = if content.config.standard_vocabulary {
        Vocabulary::standard()
    } else {
        Vocabulary::new()
    };

    for (verb, words) in &content.verbs {
        for word in words {
            vocabulary.add_verb(word, verb);
        }
    }

    for def in &content.entities {
        add_entity_words(&mut vocabulary, def);
    }
    if let Some(player) = world.player() {
        for word in SELF_WORDS {
            vocabulary.add_noun(word, player);
        }
    }

    for word in &content.words {
        let target = word_target(word, world)?;
        vocabulary.add(&word.word, word.role, target);
    }

    let mut grammar = Grammar::new();
    for def in &content.grammar {
        let mut rule = GrammarRule::parse(&def.pattern, def.action.as_str())?;
        if let Some(precondition) = &def.precondition {
            rule = rule.with_precondition(precondition.as_str());
        }
        if let Some(flag) = def.prefer {
            rule = rule.preferring(flag);
        }
        if def.favor_held {
            rule = rule.favoring_held();
        }
        grammar.push(rule);
    }
    if content.config.standard_grammar {
        for rule in Grammar::standard().rules() {
            grammar.push(rule.clone());
        }
    }

    Ok(Interpreter::new(vocabulary, grammar))
}

/// Nouns and adjectives derived from an entity's name and its extra words.
fn add_entity_words(vocabulary: &mut Vocabulary, def: &EntityDef) {
    if def.kind == EntityKind::Location {
        return;
    }
    let words: Vec<String> = def
        .name
        .split(['.', ';', '!', '?'])
        .flat_map(lex)
        .filter_map(|token| match token {
            Token::Word(word) => Some(word),
            Token::Number(_) => None,
        })
        .filter(|word| !uw_parser::vocabulary::ARTICLES.contains(&word.as_str()))
        .collect();
    if let Some((noun, adjectives)) = words.split_last() {
        vocabulary.add_noun(noun, &def.id);
        for adjective in adjectives {
            vocabulary.add_adjective(adjective, &def.id);
        }
    }
    for noun in &def.nouns {
        vocabulary.add_noun(noun, &def.id);
    }
    for adjective in &def.adjectives {
        vocabulary.add_adjective(adjective, &def.id);
    }
}

fn word_target(word: &WordDef, world: &World) -> EngineResult<Option<Target>> {
    let Some(target) = word.target.as_deref() else {
        return match word.role {
            WordRole::Preposition => Ok(None),
            role => Err(EngineError::Content(format!(
                "word \"{}\" ({role:?}) needs a target",
                word.word
            ))),
        };
    };
    match word.role {
        WordRole::Verb => Ok(Some(Target::Verb(target.to_string()))),
        WordRole::Noun | WordRole::Adjective => {
            let id = EntityId::new(target);
            if !world.contains(&id) {
                return Err(EngineError::Content(format!(
                    "word \"{}\" refers to unknown entity {id}",
                    word.word
                )));
            }
            Ok(Some(Target::Entity(id)))
        }
        WordRole::Direction => Direction::parse(target)
            .map(|d| Some(Target::Direction(d)))
            .ok_or_else(|| {
                EngineError::Content(format!(
                    "word \"{}\" names unknown direction \"{target}\"",
                    word.word
                ))
            }),
        WordRole::Preposition => Ok(None),
    }
}
