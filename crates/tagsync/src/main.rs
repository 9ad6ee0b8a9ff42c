//! tagsync command-line entry point
//!
//! ```text
//! tagsync verify [--component NAME]   # exit 1 on any mismatch
//! tagsync update [--component NAME]   # rewrite stale tags in place
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tagsync_logging::{init_logging, LogConfig};

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "tagsync",
    version,
    about = "Keep container image tags consistent with each component's version file"
)]
struct Cli {
    /// Enable verbose logging (debug output to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Project root to scan
    #[arg(long, global = true, env = "TAGSYNC_ROOT", default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/tagsync.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a rotated file in this directory
    #[arg(long, global = true, env = "TAGSYNC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report every image reference whose tag differs from its version file
    Verify {
        /// Only check this component (default: all)
        #[arg(short, long)]
        component: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite stale image references to the current version
    Update {
        /// Only update this component (default: all)
        #[arg(short, long)]
        component: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Verify { json, .. } | Commands::Update { json, .. } => *json,
        }
    }
}

fn run_command(cli: Cli) -> anyhow::Result<()> {
    let project = cli::ProjectArgs {
        root: cli.root,
        config: cli.config,
    };

    match cli.command {
        Commands::Verify { component, json } => cli::verify::run(cli::verify::VerifyArgs {
            project,
            component,
            json,
        }),
        Commands::Update { component, json } => cli::update::run(cli::update::UpdateArgs {
            project,
            component,
            json,
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.command.wants_json();

    if let Err(err) = init_logging(LogConfig {
        app_name: "tagsync",
        verbose: cli.verbose,
        log_dir: cli.log_dir.as_deref(),
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
