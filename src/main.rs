//! escrow-admin - a terminal console for escrow back-office records
//!
//! This is the main entry point. It parses flags, loads the config, sets up
//! file logging and runs the component loop.

mod action;
mod app;
mod component;
mod components;
mod config;
mod error;
mod logging;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::config::Config;
use crate::services::api::HttpApi;
use crate::tui::Tui;
use anyhow::{anyhow, Result};
use clap::Parser;
use crossterm::event::Event;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "escrow-admin")]
#[command(about = "Browse and edit escrow back-office records from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend base URL, e.g. https://escrow.example.com
    #[arg(long)]
    base_url: Option<String>,

    /// Resource to open first (agreements, parties, accounts, ...)
    #[arg(long, short)]
    resource: Option<String>,

    /// Rows per page
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=500))]
    page_size: Option<u64>,

    /// Label language code (EN, AR)
    #[arg(long)]
    language: Option<String>,

    /// Delay before refetching after a change, in milliseconds
    #[arg(long)]
    settle_delay_ms: Option<u64>,

    /// Log file (defaults to ~/.escrow-admin/escrow-admin.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// More verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Session overrides on top of the saved config
    fn apply(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(resource) = &self.resource {
            config.default_resource = resource.clone();
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size as usize;
        }
        if let Some(language) = &self.language {
            config.language = language.to_uppercase();
        }
        if let Some(delay) = self.settle_delay_ms {
            config.settle_delay_ms = delay;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply(&mut config);
    if cli.save_config {
        config.save()?;
        println!("Saved settings for {}", config.base_url);
        return Ok(());
    }

    let log_path = cli
        .log_file
        .clone()
        .or_else(Config::log_path)
        .ok_or_else(|| anyhow!("Could not determine log file path; pass --log-file"))?;
    logging::init(&log_path, cli.verbose)?;

    let api = HttpApi::new(config.endpoints(), config.request_timeout())?;
    let resource = config.default_resource.clone();
    let mut app = App::new(config, Arc::new(api), &resource)?;

    // Setup terminal
    let mut tui = Tui::new()?.with_tick_rate(Duration::from_millis(100));
    tui.enter()?;

    app.init()?;
    let result = run_app(&mut tui, &mut app);

    // Cleanup terminal
    tui.exit()?;

    if let Err(err) = result {
        error!(error = ?err, "app loop failed");
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        tui.draw(|frame| {
            if let Err(e) = app.draw(frame, frame.area()) {
                error!(error = %e, "draw failed");
            }
        })?;

        if let Some(event) = tui.next_event()? {
            let action = match event {
                Event::Key(key) => app.handle_key_event(key)?,
                Event::Mouse(mouse) => app.handle_mouse_event(mouse)?,
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                _ => None,
            };

            // Action might produce a follow-up action
            let mut current_action = action;
            while let Some(a) = current_action {
                current_action = app.update(a)?;
            }
        } else {
            // No event - tick polls jobs and scheduled refetches
            app.update(Action::Tick)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "escrow-admin",
            "--base-url",
            "http://localhost:8080",
            "-r",
            "parties",
            "--page-size",
            "50",
            "--language",
            "ar",
            "-vv",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.default_resource, "parties");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.language, "AR");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        assert!(Cli::try_parse_from(["escrow-admin", "--page-size", "0"]).is_err());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["escrow-admin"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.default_resource, Config::default().default_resource);
        assert_eq!(config.settle_delay_ms, Config::default().settle_delay_ms);
    }
}
