// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Karhebti slots CLI - reservation slot calculator for garage bookings

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use karhebti_slots::client::{BackendApi, HttpBackend};
use karhebti_slots::commands::{self, Output};
use karhebti_slots::config;
use karhebti_slots::slots::TimeSlot;
use karhebti_slots::types::{DEFAULT_CLOSING, DEFAULT_OPENING};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "karhebti-slots")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "KARHEBTI_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookable hours for a garage's opening hours
    Slots {
        /// Opening time (HH:MM)
        #[arg(long, default_value = DEFAULT_OPENING)]
        opening: String,

        /// Closing time (HH:MM)
        #[arg(long, default_value = DEFAULT_CLOSING)]
        closing: String,

        /// Chosen start time; lists the valid end times
        #[arg(long)]
        start: Option<TimeSlot>,

        /// Chosen end time; checks the range and prints its duration
        #[arg(long)]
        end: Option<TimeSlot>,
    },

    /// List the days a reservation can be booked on
    Dates {
        /// Number of days from today (defaults to the configured window)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Validate a booking form offline
    Check {
        /// Opening time (HH:MM)
        #[arg(long, default_value = DEFAULT_OPENING)]
        opening: String,

        /// Closing time (HH:MM)
        #[arg(long, default_value = DEFAULT_CLOSING)]
        closing: String,

        /// Reservation date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Start time (HH:00)
        #[arg(long)]
        start: Option<TimeSlot>,

        /// End time (HH:00)
        #[arg(long)]
        end: Option<TimeSlot>,

        /// Service type (repeatable)
        #[arg(long = "service")]
        services: Vec<String>,
    },

    /// Ask the backend which repair bays are free for a window
    Availability {
        /// Garage ID
        garage: String,

        /// Reservation date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start time (HH:00)
        #[arg(long)]
        start: TimeSlot,

        /// End time (HH:00)
        #[arg(long)]
        end: TimeSlot,
    },

    /// Validate and submit a reservation
    Book {
        /// Garage ID
        garage: String,

        /// Reservation date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start time (HH:00)
        #[arg(long)]
        start: TimeSlot,

        /// End time (HH:00)
        #[arg(long)]
        end: TimeSlot,

        /// Service type (repeatable)
        #[arg(long = "service")]
        services: Vec<String>,

        /// Comment for the garage
        #[arg(long)]
        comment: Option<String>,

        /// Validate only, do not submit
        #[arg(long)]
        dry_run: bool,
    },

    /// Change a garage's number of repair bays
    Bays {
        /// Garage ID
        garage: String,

        /// New number of bays (1-10)
        #[arg(long)]
        count: u32,

        /// Save the change (otherwise only report it)
        #[arg(long)]
        apply: bool,
    },

    /// Show the effective configuration
    Config {
        /// Configuration key (omit to show everything)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn backend(config: &config::Config) -> Result<Arc<dyn BackendApi>> {
    let client = HttpBackend::from_config(config).context("Failed to set up the backend client")?;
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    // Initialize logging
    let filter = match (cli.quiet, cli.verbose) {
        (true, 0) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        (_, 1) => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let out = Output {
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Slots { opening, closing, start, end } => {
            commands::slots::run(out, &opening, &closing, start, end)
        }
        Commands::Dates { days } => {
            let today = Local::now().date_naive();
            commands::dates::run(out, today, days.unwrap_or(config.booking_window_days))
        }
        Commands::Check { opening, closing, date, start, end, services } => {
            commands::check::run(out, commands::check::CheckArgs { opening, closing, date, start, end, services })
        }
        Commands::Availability { garage, date, start, end } => {
            commands::availability::run(out, backend(&config)?, garage, date, start, end).await
        }
        Commands::Book { garage, date, start, end, services, comment, dry_run } => {
            let args = commands::book::BookArgs {
                garage_id: garage,
                date,
                start,
                end,
                services,
                comment,
                dry_run,
            };
            commands::book::run(out, backend(&config)?, &config, args).await
        }
        Commands::Bays { garage, count, apply } => {
            commands::bays::run(out, backend(&config)?, &config, &garage, count, apply, Utc::now()).await
        }
        Commands::Config { key } => {
            commands::config::run(out, &config, key.as_deref())
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
