use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::component::ComponentSet;
use crate::error::CoreError;

/// Stable, author-assigned identifier for every entity in the world.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A room or other place the player can stand in.
    Location,
    /// A thing: portable or not, possibly a container.
    Item,
    /// A non-player character.
    Character,
    /// The player. A character without a schedule.
    Player,
}

impl EntityKind {
    /// Characters and the player both count as people.
    pub fn is_person(self) -> bool {
        matches!(self, Self::Character | Self::Player)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location => write!(f, "location"),
            Self::Item => write!(f, "item"),
            Self::Character => write!(f, "character"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// Boolean state bits an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// Can be picked up.
    Portable,
    /// Can hold other things inside it.
    Container,
    /// Can be opened and closed.
    Openable,
    /// Currently open.
    Open,
    /// Currently locked.
    Locked,
    /// Contents stay visible while closed.
    Transparent,
    /// Lights up its surroundings when lit.
    ProvidesLight,
    /// Light source is switched on.
    Lit,
    /// Has text to read.
    Readable,
    /// Is a person.
    Person,
    /// Not visible until found.
    Hidden,
    /// Cannot be moved.
    Fixed,
    /// Things can be put on it.
    Surface,
    /// Counts toward solving the case.
    Evidence,
    /// Evidence the player has collected.
    Collected,
    /// Has been searched.
    Searched,
    /// Room has been visited.
    Visited,
    /// Proper noun: no article in prose.
    Proper,
    /// Plural noun: "some" instead of "a".
    Plural,
    /// The character's schedule is suspended.
    Detained,
}

impl Flag {
    /// Every flag, in canonical order.
    pub const ALL: [Flag; 20] = [
        Self::Portable,
        Self::Container,
        Self::Openable,
        Self::Open,
        Self::Locked,
        Self::Transparent,
        Self::ProvidesLight,
        Self::Lit,
        Self::Readable,
        Self::Person,
        Self::Hidden,
        Self::Fixed,
        Self::Surface,
        Self::Evidence,
        Self::Collected,
        Self::Searched,
        Self::Visited,
        Self::Proper,
        Self::Plural,
        Self::Detained,
    ];
}

impl FromStr for Flag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|flag| flag.to_string() == wanted)
            .ok_or_else(|| CoreError::Validation(format!("unknown flag \"{s}\"")))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Portable => "portable",
            Self::Container => "container",
            Self::Openable => "openable",
            Self::Open => "open",
            Self::Locked => "locked",
            Self::Transparent => "transparent",
            Self::ProvidesLight => "provides_light",
            Self::Lit => "lit",
            Self::Readable => "readable",
            Self::Person => "person",
            Self::Hidden => "hidden",
            Self::Fixed => "fixed",
            Self::Surface => "surface",
            Self::Evidence => "evidence",
            Self::Collected => "collected",
            Self::Searched => "searched",
            Self::Visited => "visited",
            Self::Proper => "proper",
            Self::Plural => "plural",
            Self::Detained => "detained",
        };
        f.write_str(name)
    }
}

/// A flexible property value for author-defined data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean value.
    Boolean(bool),
    /// A 64-bit signed integer value.
    Integer(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A text value.
    String(String),
    /// An ordered list of values.
    List(Vec<PropertyValue>),
    /// A string-keyed map of values.
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// The value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer. Floats are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(n) => Some(*n as i64),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The value as a map, if it is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Map(_) => write!(f, "{{...}}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Core entity struct. Every game object is an Entity.
///
/// `location` and `contents` are private: only [`crate::World`] may change
/// them, so that the two stay each other's inverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// The kind of this entity.
    pub kind: EntityKind,
    /// Display name, without article.
    pub name: String,
    /// One-line description used when listing the entity in a room.
    #[serde(default)]
    pub short_description: Option<String>,
    /// Long description shown on examination.
    #[serde(default)]
    pub description: String,
    /// Boolean state.
    #[serde(default)]
    pub flags: BTreeSet<Flag>,
    /// Author-defined key/value data.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Typed data for rooms and characters.
    #[serde(default)]
    pub components: ComponentSet,
    /// Per-entity verb overrides: action id to override handler id.
    #[serde(default)]
    pub hooks: BTreeMap<String, String>,
    #[serde(default)]
    pub(crate) location: Option<EntityId>,
    #[serde(default)]
    pub(crate) contents: BTreeSet<EntityId>,
}

impl Entity {
    /// Create an entity that is nowhere yet.
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, name: impl Into<String>) -> Self {
        let mut flags = BTreeSet::new();
        if kind.is_person() {
            flags.insert(Flag::Person);
        }
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            short_description: None,
            description: String::new(),
            flags,
            properties: BTreeMap::new(),
            components: ComponentSet::default(),
            hooks: BTreeMap::new(),
            location: None,
            contents: BTreeSet::new(),
        }
    }

    /// Set the long description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a flag.
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Set a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Register an override handler for an action.
    pub fn with_hook(mut self, action: impl Into<String>, handler: impl Into<String>) -> Self {
        self.hooks.insert(action.into(), handler.into());
        self
    }

    /// The entity directly containing this one, if any.
    pub fn location(&self) -> Option<&EntityId> {
        self.location.as_ref()
    }

    /// Entities directly contained in this one, in canonical order.
    pub fn contents(&self) -> std::collections::btree_set::Iter<'_, EntityId> {
        self.contents.iter()
    }

    /// Whether `id` is directly inside this entity.
    pub fn directly_contains(&self, id: &EntityId) -> bool {
        self.contents.contains(id)
    }

    /// Check a flag.
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Set a flag. Returns `true` if it was not set before.
    pub fn set_flag(&mut self, flag: Flag) -> bool {
        self.flags.insert(flag)
    }

    /// Clear a flag. Returns `true` if it was set before.
    pub fn clear_flag(&mut self, flag: Flag) -> bool {
        self.flags.remove(&flag)
    }

    /// Look up a property.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// A string property, if present and a string.
    pub fn text_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(PropertyValue::as_str)
    }

    /// An integer property, falling back to `default` when absent.
    pub fn int_property_or(&self, key: &str, default: i64) -> i64 {
        self.property(key)
            .and_then(PropertyValue::as_i64)
            .unwrap_or(default)
    }

    /// The override handler registered for an action, if any.
    pub fn override_for(&self, action: &str) -> Option<&str> {
        self.hooks.get(action).map(String::as_str)
    }

    /// A container that is shut and cannot be seen into.
    pub fn is_closed_container(&self) -> bool {
        self.has_flag(Flag::Container)
            && !self.has_flag(Flag::Open)
            && !self.has_flag(Flag::Transparent)
    }

    /// Whether an observer standing outside can see this entity's contents.
    pub fn exposes_contents_to(&self, observer: &EntityId) -> bool {
        if self.is_closed_container() {
            return false;
        }
        !(self.kind.is_person() && &self.id != observer)
    }

    /// Name with a definite article: "the brass key", or "Mrs. Robner".
    pub fn definite_name(&self) -> String {
        if self.has_flag(Flag::Proper) || self.kind.is_person() {
            self.name.clone()
        } else {
            format!("the {}", self.name)
        }
    }

    /// Name with an indefinite article: "a note", "an envelope", "some papers".
    pub fn indefinite_name(&self) -> String {
        if self.has_flag(Flag::Proper) || self.kind.is_person() {
            return self.name.clone();
        }
        if self.has_flag(Flag::Plural) {
            return format!("some {}", self.name);
        }
        let vowel = self
            .name
            .chars()
            .next()
            .is_some_and(|c| "aeiouAEIOU".contains(c));
        if vowel {
            format!("an {}", self.name)
        } else {
            format!("a {}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_person_gets_person_flag() {
        let butler = Entity::new("butler", EntityKind::Character, "Mr. Dunbar");
        assert!(butler.has_flag(Flag::Person));
        let note = Entity::new("note", EntityKind::Item, "note");
        assert!(!note.has_flag(Flag::Person));
    }

    #[test]
    fn articles() {
        let note = Entity::new("note", EntityKind::Item, "note");
        assert_eq!(note.indefinite_name(), "a note");
        assert_eq!(note.definite_name(), "the note");

        let envelope = Entity::new("envelope", EntityKind::Item, "envelope");
        assert_eq!(envelope.indefinite_name(), "an envelope");

        let papers = Entity::new("papers", EntityKind::Item, "papers").with_flag(Flag::Plural);
        assert_eq!(papers.indefinite_name(), "some papers");

        let robner =
            Entity::new("robner", EntityKind::Item, "Robner's will").with_flag(Flag::Proper);
        assert_eq!(robner.definite_name(), "Robner's will");
    }

    #[test]
    fn closed_container_hides_contents() {
        let mut chest = Entity::new("chest", EntityKind::Item, "chest").with_flag(Flag::Container);
        let player = EntityId::new("player");
        assert!(!chest.exposes_contents_to(&player));

        chest.set_flag(Flag::Open);
        assert!(chest.exposes_contents_to(&player));

        chest.clear_flag(Flag::Open);
        chest.set_flag(Flag::Transparent);
        assert!(chest.exposes_contents_to(&player));
    }

    #[test]
    fn people_hide_their_pockets_from_others() {
        let player = Entity::new("player", EntityKind::Player, "yourself");
        assert!(player.exposes_contents_to(&EntityId::new("player")));
        assert!(!player.exposes_contents_to(&EntityId::new("butler")));
    }

    #[test]
    fn property_value_accessors() {
        let note = Entity::new("note", EntityKind::Item, "note")
            .with_property("size", 2)
            .with_property("text", "Meet me at noon.");
        assert_eq!(note.int_property_or("size", 0), 2);
        assert_eq!(note.int_property_or("weight", 7), 7);
        assert_eq!(note.text_property("text"), Some("Meet me at noon."));
        assert_eq!(note.text_property("size"), None);
    }

    #[test]
    fn property_value_deserializes_untagged() {
        let value: PropertyValue = serde_json::from_str("[1, 2.5, \"x\", true]").unwrap();
        assert_eq!(
            value,
            PropertyValue::List(vec![
                PropertyValue::Integer(1),
                PropertyValue::Float(2.5),
                PropertyValue::String("x".into()),
                PropertyValue::Boolean(true),
            ])
        );
    }

    #[test]
    fn flags_parse_from_names() {
        assert_eq!("provides_light".parse::<Flag>(), Ok(Flag::ProvidesLight));
        assert_eq!("Provides-Light".parse::<Flag>(), Ok(Flag::ProvidesLight));
        for flag in Flag::ALL {
            assert_eq!(flag.to_string().parse::<Flag>(), Ok(flag));
        }
        assert!("sparkly".parse::<Flag>().is_err());
    }

    #[test]
    fn hooks_lookup() {
        let portrait = Entity::new("portrait", EntityKind::Item, "portrait").with_hook("take", "refuse");
        assert_eq!(portrait.override_for("take"), Some("refuse"));
        assert_eq!(portrait.override_for("drop"), None);
    }
}
