use anyhow::{Context, Result};
use cellpower_liberty::read_liberty_file;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod commands;
mod config;

use commands::ReportOptions;
use config::Config;

/// cellpower - Internal power lookup for Liberty libraries
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Report internal power of a cell at one operating point
    Report {
        /// Liberty file
        library: PathBuf,

        /// Cell name
        #[arg(short, long)]
        cell: String,

        /// Only records of this pin
        #[arg(short, long)]
        pin: Option<String>,

        /// Input transition, in library time units
        #[arg(short, long)]
        slew: f64,

        /// Output load, in library capacitance units
        #[arg(short, long)]
        load: f64,

        /// Digits after the decimal point
        #[arg(short, long)]
        digits: Option<usize>,

        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List every internal power table and whether its axes resolve
    Check {
        /// Liberty file
        library: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Report {
            library,
            cell,
            pin,
            slew,
            load,
            digits,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let lib = read_liberty_file(&library)
                .with_context(|| format!("Failed to load library {:?}", library))?;
            info!("Loaded library '{}'", lib.name);

            let options = ReportOptions {
                cell,
                pin,
                slew,
                load,
                digits: digits.unwrap_or(config.report.digits),
                corner: config.corner,
            };
            print!("{}", commands::report(&lib, &options)?);
        }

        Commands::Check { library } => {
            let lib = read_liberty_file(&library)
                .with_context(|| format!("Failed to load library {:?}", library))?;
            info!("Loaded library '{}' with {} cells", lib.name, lib.cells().count());
            print!("{}", commands::check(&lib)?);
        }
    }

    Ok(())
}
