pub mod check;
pub mod play;

use std::path::Path;

use miette::{IntoDiagnostic, WrapErr};
use uw_engine::{Content, Game};

/// Read and parse a content file.
fn read_content(path: &Path) -> miette::Result<Content> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Content::from_json(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to parse {}", path.display()))
}

/// Load a content file into a ready-to-play game.
fn load_game(path: &Path) -> miette::Result<Game> {
    let content = read_content(path)?;
    Game::new(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid story in {}", path.display()))
}
