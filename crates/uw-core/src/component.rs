use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, PropertyValue};

/// The set of typed components attached to an entity.
/// Rooms carry a `location` component and characters a `character` one,
/// but an entity may hold either, both or neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentSet {
    /// Exit map for rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationComponent>,
    /// Dialogue and schedule for characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterComponent>,
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Compass and vertical directions an exit can lead in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// North.
    North,
    /// South.
    South,
    /// East.
    East,
    /// West.
    West,
    /// Northeast.
    Northeast,
    /// Northwest.
    Northwest,
    /// Southeast.
    Southeast,
    /// Southwest.
    Southwest,
    /// Up.
    Up,
    /// Down.
    Down,
    /// In.
    In,
    /// Out.
    Out,
}

impl Direction {
    /// Every direction, in canonical order.
    pub const ALL: [Direction; 12] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Northeast,
        Self::Northwest,
        Self::Southeast,
        Self::Southwest,
        Self::Up,
        Self::Down,
        Self::In,
        Self::Out,
    ];

    /// Parse a direction from a full name or abbreviation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "n" | "north" => Some(Self::North),
            "s" | "south" => Some(Self::South),
            "e" | "east" => Some(Self::East),
            "w" | "west" => Some(Self::West),
            "ne" | "northeast" => Some(Self::Northeast),
            "nw" | "northwest" => Some(Self::Northwest),
            "se" | "southeast" => Some(Self::Southeast),
            "sw" | "southwest" => Some(Self::Southwest),
            "u" | "up" => Some(Self::Up),
            "d" | "down" => Some(Self::Down),
            "in" | "inside" => Some(Self::In),
            "out" | "outside" => Some(Self::Out),
            _ => None,
        }
    }

    /// Get the display name for this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Northeast => "northeast",
            Self::Northwest => "northwest",
            Self::Southeast => "southeast",
            Self::Southwest => "southwest",
            Self::Up => "up",
            Self::Down => "down",
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// The short form players may type.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::Northeast => "ne",
            Self::Northwest => "nw",
            Self::Southeast => "se",
            Self::Southwest => "sw",
            Self::Up => "u",
            Self::Down => "d",
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// The direction leading back.
    pub fn opposite(&self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Northeast => Self::Southwest,
            Self::Northwest => Self::Southeast,
            Self::Southeast => Self::Northwest,
            Self::Southwest => Self::Northeast,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Spatial connectivity of a room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationComponent {
    /// Where each exit leads.
    #[serde(default)]
    pub exits: BTreeMap<Direction, EntityId>,
}

impl LocationComponent {
    /// Add an exit.
    pub fn with_exit(mut self, direction: Direction, to: impl Into<EntityId>) -> Self {
        self.exits.insert(direction, to.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// Dialogue, knowledge and daily schedule of a character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterComponent {
    /// Replies keyed by topic word.
    #[serde(default)]
    pub topics: BTreeMap<String, String>,
    /// Free-form knowledge state.
    #[serde(default)]
    pub knowledge: BTreeMap<String, PropertyValue>,
    /// Time-stamped intents, sorted by `at`.
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

impl CharacterComponent {
    /// Index of the schedule entry whose window contains `minute`.
    ///
    /// An entry's window runs from its `at` up to the next entry's `at`. The
    /// last entry stays current forever. Returns `None` before the first entry.
    pub fn entry_at(&self, minute: i64) -> Option<usize> {
        self.schedule
            .iter()
            .enumerate()
            .take_while(|(_, entry)| entry.at <= minute)
            .map(|(i, _)| i)
            .last()
    }
}

/// One intended activity of a character from a given minute on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Absolute game-clock minute at which the entry becomes current.
    pub at: i64,
    /// Where the character should be. `None` leaves the character in place.
    #[serde(default)]
    pub location: Option<EntityId>,
    /// What the character is doing, shown when the player sees them.
    #[serde(default)]
    pub activity: Option<String>,
    /// Extra line printed when the player witnesses the transition.
    #[serde(default)]
    pub announce: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(at: i64, location: &str) -> ScheduleEntry {
        ScheduleEntry {
            at,
            location: Some(EntityId::new(location)),
            activity: None,
            announce: None,
        }
    }

    #[test]
    fn parse_direction_abbreviations() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("NE"), Some(Direction::Northeast));
        assert_eq!(Direction::parse("out"), Some(Direction::Out));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn every_direction_round_trips_through_its_names() {
        for dir in Direction::ALL {
            assert_eq!(Direction::parse(dir.name()), Some(dir));
            assert_eq!(Direction::parse(dir.abbreviation()), Some(dir));
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn schedule_windows() {
        let character = CharacterComponent {
            schedule: vec![entry(480, "kitchen"), entry(540, "garden"), entry(600, "study")],
            ..Default::default()
        };
        assert_eq!(character.entry_at(479), None);
        assert_eq!(character.entry_at(480), Some(0));
        assert_eq!(character.entry_at(539), Some(0));
        assert_eq!(character.entry_at(540), Some(1));
        assert_eq!(character.entry_at(10_000), Some(2));
    }

    #[test]
    fn exits_serialize_with_direction_keys() {
        let room = LocationComponent::default().with_exit(Direction::North, "hall");
        let json = serde_json::to_string(&room).unwrap();
        assert_eq!(json, r#"{"exits":{"north":"hall"}}"#);
    }
}
