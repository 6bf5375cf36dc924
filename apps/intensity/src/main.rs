//! # Intensity
//!
//! Command-line entry point for whole-image intensity measurement.

use clap::{Parser, Subcommand};
use intensity::cli::{
    cmd_columns, cmd_init, cmd_measure, cmd_show, cmd_upgrade, MeasureInputs,
};
use intensity::error::CliError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "intensity", version, about = "Whole-image intensity measurement")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a settings file.
    Init {
        settings: PathBuf,
        /// IMAGE or IMAGE:OBJECTS, repeatable.
        #[arg(long = "image", value_name = "IMAGE[:OBJECTS]", required = true)]
        images: Vec<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print a settings file.
    Show {
        settings: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Rewrite a legacy settings file at the current revision.
    Upgrade { settings: PathBuf },
    /// List the measurement columns a settings file produces.
    Columns {
        settings: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Measure image files.
    Measure {
        settings: PathBuf,
        /// Image file as NAME=PATH, repeatable.
        #[arg(long = "load", value_name = "NAME=PATH", required = true)]
        images: Vec<String>,
        /// Mask for a loaded image as NAME=PATH, repeatable.
        #[arg(long = "mask", value_name = "NAME=PATH")]
        masks: Vec<String>,
        /// Label map as NAME=PATH, repeatable.
        #[arg(long = "objects", value_name = "NAME=PATH")]
        objects: Vec<String>,
        #[arg(long)]
        json: bool,
        /// Also write the JSON report to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Init {
            settings,
            images,
            force,
        } => cmd_init(&settings, &images, force),
        Command::Show { settings, json } => cmd_show(&settings, json).map(drop),
        Command::Upgrade { settings } => cmd_upgrade(&settings).map(drop),
        Command::Columns { settings, json } => cmd_columns(&settings, json).map(drop),
        Command::Measure {
            settings,
            images,
            masks,
            objects,
            json,
            output,
        } => {
            let inputs = MeasureInputs {
                images,
                masks,
                objects,
            };
            cmd_measure(&settings, &inputs, json, output.as_deref()).map(drop)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
