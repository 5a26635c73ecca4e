//! Turn-loop behaviour on a small hand-built story.

use uw_core::EntityId;
use uw_engine::{Game, TurnResult};

const KEYS: &str = r#"{
    "title": "Keys",
    "config": { "start_minute": 480, "time_limit": null },
    "entities": [
        { "id": "hall", "kind": "location", "name": "Hall",
          "description": "A bare hall.", "exits": { "north": "attic" } },
        { "id": "attic", "kind": "location", "name": "Attic", "dark": true,
          "exits": { "south": "hall" } },
        { "id": "me", "kind": "player", "name": "yourself", "location": "hall" },
        { "id": "brass", "kind": "item", "name": "brass key", "flags": ["portable"], "location": "hall" },
        { "id": "silver", "kind": "item", "name": "silver key", "flags": ["portable"], "location": "hall" },
        { "id": "chest", "kind": "item", "name": "chest", "flags": ["container", "openable"], "location": "hall" },
        { "id": "coin", "kind": "item", "name": "gold coin", "flags": ["portable"], "location": "chest" }
    ]
}"#;

fn game() -> Game {
    Game::from_json(KEYS).unwrap()
}

fn holder(game: &Game, id: &str) -> Option<EntityId> {
    game.world().get(&id.into()).and_then(|e| e.location().cloned())
}

/// Run `lines`, answering any disambiguation question with the next line.
fn transcript(game: &mut Game, lines: &[&str]) -> String {
    let mut out = Vec::new();
    let mut pending: Option<TurnResult> = None;
    for line in lines {
        out.push(format!("> {line}"));
        let turn = match pending.take().and_then(|t| t.ambiguity) {
            Some(question) => game.clarify(&question, line).unwrap(),
            None => game.submit_command(line).unwrap(),
        };
        out.extend(turn.narrative.iter().cloned());
        pending = Some(turn);
    }
    out.join("\n")
}

#[test]
fn take_note_walk_and_examine() {
    let content = r#"{
        "title": "Note",
        "entities": [
            { "id": "hall", "kind": "location", "name": "Hall", "exits": { "north": "study" } },
            { "id": "study", "kind": "location", "name": "Study", "exits": { "south": "hall" } },
            { "id": "me", "kind": "player", "name": "yourself", "location": "hall" },
            { "id": "note", "kind": "item", "name": "note", "flags": ["portable"],
              "description": "A hastily scrawled note.", "location": "hall" }
        ]
    }"#;
    let mut game = Game::from_json(content).unwrap();

    let take = game.submit_command("take note").unwrap();
    assert_eq!(take.narrative, ["Taken."]);
    assert!(take.time_advanced);
    assert_eq!(take.minutes, 1);

    let north = game.submit_command("north").unwrap();
    assert_eq!(north.narrative[0], "Study");

    let examine = game.submit_command("examine note").unwrap();
    assert_eq!(examine.narrative, ["A hastily scrawled note."]);
    assert!(!examine.time_advanced);

    assert_eq!(game.now(), 482);
    assert_eq!(game.moves(), 2);
    assert_eq!(holder(&game, "note"), Some(EntityId::new("me")));
}

#[test]
fn ambiguous_nouns_ask_and_clarify() {
    let mut game = game();
    let question = game.submit_command("take key").unwrap();
    assert_eq!(
        question.narrative,
        ["Which do you mean, the brass key or the silver key?"]
    );
    assert!(!question.time_advanced);
    let ambiguity = question.ambiguity.expect("ambiguity is returned");
    assert_eq!(ambiguity.candidates, [EntityId::new("brass"), EntityId::new("silver")]);

    let answer = game.clarify(&ambiguity, "the brass one").unwrap();
    assert_eq!(answer.narrative, ["Taken."]);
    assert_eq!(holder(&game, "brass"), Some(EntityId::new("me")));

    // The held key no longer competes for "take".
    let again = game.submit_command("take key").unwrap();
    assert_eq!(again.narrative, ["Taken."]);
    assert_eq!(holder(&game, "silver"), Some(EntityId::new("me")));
}

#[test]
fn a_non_answer_runs_as_a_new_command() {
    let mut game = game();
    let question = game.submit_command("take key").unwrap();
    let ambiguity = question.ambiguity.unwrap();
    let turn = game.clarify(&ambiguity, "north").unwrap();
    assert_eq!(turn.narrative, ["It is pitch dark. You can't see a thing."]);
}

#[test]
fn closed_containers_hide_their_contents() {
    let mut game = game();
    assert_eq!(
        game.submit_command("take coin").unwrap().narrative,
        ["I don't see any coin here."]
    );
    game.submit_command("open chest").unwrap();
    assert_eq!(game.submit_command("take coin").unwrap().narrative, ["Taken."]);
}

#[test]
fn pronouns_follow_the_last_object() {
    let mut game = game();
    assert_eq!(
        game.submit_command("take it").unwrap().narrative,
        ["I don't know what \"it\" refers to."]
    );
    game.submit_command("open chest").unwrap();
    game.submit_command("take gold coin").unwrap();
    let drop = game.submit_command("drop it").unwrap();
    assert_eq!(drop.narrative, ["Dropped."]);
    assert_eq!(game.last_referent(), Some(&EntityId::new("coin")));
}

#[test]
fn honorifics_in_names_and_commands() {
    let content = r#"{
        "title": "Widow",
        "config": { "time_limit": null },
        "entities": [
            { "id": "parlor", "kind": "location", "name": "Parlor" },
            { "id": "me", "kind": "player", "name": "yourself", "location": "parlor" },
            { "id": "robner", "kind": "character", "name": "Mrs. Robner", "location": "parlor",
              "topics": { "will": "George changed it last week." } }
        ]
    }"#;
    let mut game = Game::from_json(content).unwrap();

    assert_eq!(
        game.submit_command("talk to robner").unwrap().narrative,
        ["Mrs. Robner nods at you."]
    );
    assert_eq!(
        game.submit_command("ask mrs. robner about will").unwrap().narrative,
        ["Mrs. Robner says, \"George changed it last week.\""]
    );
}

#[test]
fn the_same_commands_give_the_same_game() {
    let lines = ["open chest", "take coin", "take silver key", "north", "wait 25", "south", "look"];
    let mut first = game();
    let mut second = game();
    let a: Vec<_> = lines.iter().map(|l| first.submit_command(l).unwrap()).collect();
    let b: Vec<_> = lines.iter().map(|l| second.submit_command(l).unwrap()).collect();
    assert_eq!(a, b);
    assert_eq!(first.serialize_state().unwrap(), second.serialize_state().unwrap());
}

#[test]
fn snapshot_then_keep_playing() {
    let mut game = game();
    game.submit_command("open chest").unwrap();
    game.submit_command("take coin").unwrap();
    let saved = game.serialize_state().unwrap();

    let rest = ["take brass key", "north", "drop coin", "south", "wait 15"];
    let original: Vec<_> = rest.iter().map(|l| game.submit_command(l).unwrap()).collect();
    let after = game.serialize_state().unwrap();

    game.restore_state(&saved).unwrap();
    assert_eq!(game.now(), 482);
    assert_eq!(holder(&game, "coin"), Some(EntityId::new("me")));

    let replayed: Vec<_> = rest.iter().map(|l| game.submit_command(l).unwrap()).collect();
    assert_eq!(original, replayed);
    assert_eq!(game.serialize_state().unwrap(), after);
}

#[test]
fn snapshots_from_another_story_are_rejected() {
    let mut game = game();
    game.submit_command("take silver key").unwrap();
    let before = game.serialize_state().unwrap();

    let other = Game::from_json(include_str!("../../../worlds/manor.json")).unwrap();
    let foreign = other.serialize_state().unwrap();
    assert!(game.restore_state(&foreign).is_err());
    assert_eq!(game.serialize_state().unwrap(), before);
}

#[test]
fn short_session_transcript() {
    let mut game = game();
    let text = transcript(
        &mut game,
        &["look", "take key", "silver", "open chest", "take coin", "north", "time"],
    );
    insta::assert_snapshot!(text, @r"
    > look
    Hall
    A bare hall.
    You can see a brass key, a chest, and a silver key here.
    Exits: north.
    > take key
    Which do you mean, the brass key or the silver key?
    > silver
    Taken.
    > open chest
    Opening the chest reveals a gold coin.
    > take coin
    Taken.
    > north
    It is pitch dark. You can't see a thing.
    > time
    It is 8:04 AM.
    ");
}
