use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

mod app;
mod catalog;
mod cli;
mod config;
mod forecast;
mod locate;
mod logging;
mod store;
#[cfg(test)]
mod testing;
mod toast;
mod ui;
mod units;
mod worker;

use crate::app::{run_app, App};
use crate::cli::Args;
use crate::config::Config;
use crate::forecast::OpenMeteo;
use crate::store::StateStore;
use crate::worker::Worker;

fn main() -> Result<()> {
    let config = Config::from_args(Args::parse())?;
    logging::init(&config.log_file)?;
    let store = StateStore::new(&config.state_file);
    tracing::info!(state = %store.path().display(), "starting");

    let mut app = App::new(store, config.units);
    if let Some(name) = &config.city {
        if let Err(e) = app.choose_main(name) {
            bail!("{name}: {e}");
        }
    }

    let forecasts =
        OpenMeteo::new(config.api_url.clone(), config.timeout).context("building HTTP client")?;
    let (worker, outcomes) = Worker::new(Arc::new(forecasts), config.build_locator());

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // run app
    let res = run_app(&mut terminal, &mut app, &worker, &outcomes);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("ui loop failed: {err}");
        return Err(err).context("running the UI");
    }

    tracing::info!("exiting");
    Ok(())
}
