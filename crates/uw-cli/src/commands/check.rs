use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use uw_core::EntityKind;
use uw_scheduler::GameClock;

pub fn run(content: &Path) -> miette::Result<()> {
    let game = super::load_game(content)?;
    let world = game.world();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Part", "Count"]);
    for (label, kind) in [
        ("Locations", EntityKind::Location),
        ("Items", EntityKind::Item),
        ("Characters", EntityKind::Character),
        ("Players", EntityKind::Player),
    ] {
        table.add_row(vec![label.to_string(), world.entities_by_kind(kind).len().to_string()]);
    }
    let interpreter = game.interpreter();
    table.add_row(vec!["Words".to_string(), interpreter.vocabulary().len().to_string()]);
    table.add_row(vec!["Grammar rules".to_string(), interpreter.grammar().rules().len().to_string()]);
    table.add_row(vec!["Pending events".to_string(), game.scheduler().pending().count().to_string()]);
    table.add_row(vec!["Daemons".to_string(), game.scheduler().daemons().len().to_string()]);

    println!("  {} '{}'", "All checks passed for".green(), world.meta.title);
    println!("{table}");
    if let Some(deadline) = game.config().deadline() {
        println!("  Deadline: {}", GameClock::new(deadline));
    }

    Ok(())
}
