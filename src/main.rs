mod app;
mod components;
mod logging;
mod storage;
mod ui;

use color_eyre::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use std::io::stdout;
use storage::Storage;

fn main() -> Result<()> {
    color_eyre::install()?;
    let storage = Storage::open(storage::default_data_dir()?)?;
    logging::init(storage.root())?;
    let app = app::App::new(storage)?;
    let terminal = ratatui::init();
    // pasted addresses arrive as one event instead of a burst of key presses
    let result = crossterm::execute!(stdout(), EnableBracketedPaste)
        .map_err(Into::into)
        .and_then(|()| app.run(terminal));
    if let Err(err) = crossterm::execute!(stdout(), DisableBracketedPaste) {
        tracing::warn!(error = %err, "failed to disable bracketed paste");
    }
    ratatui::restore();
    result
}
