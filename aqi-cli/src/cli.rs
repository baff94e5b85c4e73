use std::{future::Future, time::Duration};

use anyhow::Context;
use aqi_core::{AirQualityReport, Config, ReadingCache, provider_from_config};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::{info, warn};

use crate::render;

const FALLBACK_HINT: &str = "Hint: run `aqi configure` to check your API token and city.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "aqi", version, about = "Air quality from the World Air Quality Index")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// City name or aqicn.org city URL; overrides the configured city.
    #[arg(long)]
    pub city: Option<String>,

    /// API token; overrides the configured token.
    #[arg(long, env = "WAQI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the API token and city.
    Configure,

    /// Show current air quality and the coming days' forecast.
    Show {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep refreshing the report until interrupted.
    Watch {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Seconds between refreshes.
        #[arg(long, default_value_t = 600)]
        interval: u64,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lookup, json } => show(lookup, json).await,
            Command::Watch { lookup, interval } => watch(lookup, interval).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let token = Password::new("WAQI API token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message(if cfg.api_token.is_some() {
            "Leave empty to keep the current token"
        } else {
            "Request one at https://aqicn.org/data-platform/token/"
        })
        .prompt()?;

    if !token.trim().is_empty() || cfg.api_token.is_none() {
        cfg.set_api_token(token);
    }

    let city = Text::new("City:")
        .with_initial_value(cfg.city.as_deref().unwrap_or_default())
        .with_help_message("Name or https://aqicn.org/city/... URL; leave empty to use your location")
        .prompt()?;
    cfg.set_city(city);

    let path = cfg.save()?;
    println!("Saved configuration to {}", path.display());
    println!("Location: {}", cfg.location());

    Ok(())
}

async fn show(lookup: LookupArgs, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?.with_overrides(lookup.token, lookup.city);
    let token = cfg.api_token()?;
    let location = cfg.location();
    let provider = provider_from_config(&cfg)?;

    let reading = match provider.fetch(&location, token).await {
        Ok(reading) => reading,
        Err(err) => {
            let hint = format!("{}\n{FALLBACK_HINT}", err.user_message());
            return Err(anyhow::Error::new(err).context(hint));
        }
    };

    let report = AirQualityReport::build(&reading, Local::now().date_naive());

    if json {
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{text}");
    } else {
        print!("{}", render::render_report(&report, Utc::now())?);
    }

    Ok(())
}

async fn watch(lookup: LookupArgs, interval: u64) -> anyhow::Result<()> {
    let cfg = Config::load()?.with_overrides(lookup.token, lookup.city);
    let token = cfg.api_token()?;
    let location = cfg.location();
    let cache = ReadingCache::new(provider_from_config(&cfg)?, cfg.cache_ttl());

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    info!(%location, interval, "watching air quality");

    loop {
        let refresh = async {
            ticker.tick().await;
            cache.get(&location, token).await
        };

        // Covers the request too, not just the wait for the next tick.
        let Some(outcome) = unless_interrupted(refresh, tokio::signal::ctrl_c()).await else {
            info!("interrupted");
            return Ok(());
        };

        let today = Local::now().date_naive();

        match outcome {
            Ok(reading) => {
                let report = AirQualityReport::build(&reading, today);
                println!("{}", render::render_report(&report, Utc::now())?);
            }
            Err(err) => {
                warn!(error = %err, "refresh failed");

                match cache.state(&location, token).data {
                    Some(stale) => {
                        let report = AirQualityReport::build(&stale, today);
                        println!("(showing last good reading: {})", err);
                        println!("{}", render::render_report(&report, Utc::now())?);
                    }
                    None => {
                        eprintln!("Error: {err}\n{}\n{FALLBACK_HINT}", err.user_message());
                    }
                }
            }
        }
    }
}

/// Run `work` unless `shutdown` completes first; `work` is dropped in that case.
async fn unless_interrupted<T>(work: impl Future<Output = T>, shutdown: impl Future) -> Option<T> {
    tokio::select! {
        _ = shutdown => None,
        out = work => Some(out),
    }
}
