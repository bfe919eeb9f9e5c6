use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use std::io;
use tracing::info;
use weather_core::{Config, OpenWeatherClient, Units};

use crate::{
    menu::Session,
    probe::{ProbeDecision, startup_probe},
    prompt::InquirePrompter,
};

/// Top-level CLI struct. Without a subcommand the interactive app starts.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather by city name or ZIP code")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save the OpenWeatherMap API key and default preferences.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure) => configure(),
            None => run_app().await,
        }
    }
}

async fn run_app() -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = OpenWeatherClient::from_config(&config)?;
    let mut prompter = InquirePrompter;
    let mut stdout = io::stdout();

    let decision = startup_probe(
        &client,
        &mut prompter,
        &mut stdout,
        config.api_key(),
        config.probe.on_demo_declined,
    )
    .await?;

    if decision == ProbeDecision::Exit {
        info!("leaving after startup probe");
        return Ok(());
    }

    Session::new(client, prompter, stdout, config.units, config.default_country).run().await
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let start = Units::all().iter().position(|u| *u == config.units).unwrap_or_default();
    config.units = Select::new("Default temperature units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;

    let country = Text::new("Default country code for ZIP codes:")
        .with_default(&config.default_country)
        .prompt()
        .context("Failed to read country code")?;
    config.default_country = country.trim().to_uppercase();

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
