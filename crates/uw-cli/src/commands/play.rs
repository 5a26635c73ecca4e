//! Run a story in the console, from stdin or from a script of commands.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use miette::IntoDiagnostic;
use tracing::{debug, warn};
use uw_engine::action::meta::{RESTORE_REQUESTED, SAVE_REQUESTED};
use uw_engine::describe::describe_room;
use uw_engine::{Game, TurnResult};
use uw_parser::Ambiguity;
use uw_scheduler::GameClock;

pub fn run(content: &Path, script: Option<&Path>, no_color: bool) -> miette::Result<()> {
    if no_color {
        colored::control::set_override(false);
    }
    let mut game = super::load_game(content)?;
    let save_path = save_path(content);

    let intro = game.intro().into_diagnostic()?;
    if let Some((title, rest)) = intro.split_first() {
        println!("{}", title.bold());
        for line in rest {
            println!("{line}");
        }
    }
    println!();

    let echo = script.is_some();
    if !echo {
        print!("> ");
        io::stdout().flush().into_diagnostic()?;
    }
    let reader: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(fs::File::open(path).into_diagnostic()?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut pending: Option<Box<Ambiguity>> = None;
    for line in reader.lines() {
        let line = line.into_diagnostic()?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if echo {
            println!("{} {input}", ">".dimmed());
        }

        let turn = match pending.take() {
            Some(question) => game.clarify(&question, input),
            None => game.submit_command(input),
        }
        .into_diagnostic()?;

        print_turn(&turn);
        for signal in &turn.signals {
            handle_signal(&mut game, signal, &save_path);
        }
        if let Some(over) = &turn.game_over {
            debug!(reason = %over.reason, "story ended");
            println!();
            println!("{}", format!("*** The story has ended ({}) ***", over.reason).bold());
            println!("  Score: {} of {}", game.score(), game.config().max_score);
            break;
        }
        pending = turn.ambiguity;
        println!();
        if !echo {
            print!("> ");
            io::stdout().flush().into_diagnostic()?;
        }
    }

    Ok(())
}

fn print_turn(turn: &TurnResult) {
    for line in &turn.narrative {
        println!("{line}");
    }
    for error in &turn.errors {
        println!("{}", format!("(event failed: {error})").yellow());
    }
    if turn.time_advanced {
        println!("{}", format!("[{}]", GameClock::new(turn.clock)).dimmed());
    }
}

fn handle_signal(game: &mut Game, signal: &str, save_path: &Path) {
    match signal {
        SAVE_REQUESTED => match game.serialize_state() {
            Ok(bytes) => match fs::write(save_path, bytes) {
                Ok(()) => println!("Saved."),
                Err(e) => {
                    warn!(path = %save_path.display(), error = %e, "save failed");
                    println!("{}", format!("Could not save: {e}").yellow());
                }
            },
            Err(e) => println!("{}", format!("Could not save: {e}").yellow()),
        },
        RESTORE_REQUESTED => match fs::read(save_path) {
            Ok(bytes) => match game.restore_state(&bytes) {
                Ok(()) => {
                    println!("Restored.");
                    if let Ok(player) = game.world().player_id() {
                        for line in describe_room(game.world(), player) {
                            println!("{line}");
                        }
                    }
                }
                Err(e) => println!("{}", format!("Could not restore: {e}").yellow()),
            },
            Err(_) => println!("There is no saved game."),
        },
        _ => {}
    }
}

/// Saves live next to the content file: `manor.json` saves to `manor.save.json`.
fn save_path(content: &Path) -> PathBuf {
    content.with_extension("save.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_file_sits_next_to_the_story() {
        assert_eq!(
            save_path(Path::new("worlds/manor.json")),
            PathBuf::from("worlds/manor.save.json")
        );
    }
}
