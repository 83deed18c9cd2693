//! mapshare CLI - share one text buffer between terminal sessions
//!
//!   - main.rs: arguments and interactive role selection
//!   - roles.rs: the writer, reader and status loops

mod roles;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use inquire::Select;
use mapshare::config::{
    default_lock_dir, DEFAULT_CAPACITY, DEFAULT_PLACEHOLDER, DEFAULT_REGION_NAME, DEFAULT_TOKEN_NAME,
    ENV_FILE, ENV_LOCK_DIR, ENV_REGION, ENV_TOKEN,
};
use mapshare::{Backing, RegionConfig, RoleCoordinator, ShareConfig, ShareError, TokenConfig};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mapshare")]
#[command(about = "Share one text buffer between processes: one writer, many readers", long_about = None)]
struct Cli {
    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SessionArgs {
    /// Shared region name
    #[arg(long, env = ENV_REGION, default_value = DEFAULT_REGION_NAME, global = true)]
    region: String,

    /// Leadership token name
    #[arg(long, env = ENV_TOKEN, default_value = DEFAULT_TOKEN_NAME, global = true)]
    token: String,

    /// Directory holding the token's lock file
    #[arg(long, env = ENV_LOCK_DIR, global = true)]
    lock_dir: Option<PathBuf>,

    /// Region size in bytes, terminator included
    #[arg(long, default_value_t = DEFAULT_CAPACITY, global = true)]
    capacity: usize,

    /// Back the region with this file instead of POSIX shared memory
    #[arg(long, env = ENV_FILE, global = true)]
    file: Option<PathBuf>,

    /// Reader poll interval in milliseconds
    #[arg(long, default_value_t = 300, global = true)]
    poll_ms: u64,

    /// Availability probe interval in milliseconds
    #[arg(long, default_value_t = 1000, global = true)]
    probe_ms: u64,

    /// Leave the region in place when the writer exits
    #[arg(long, global = true)]
    keep_region: bool,
}

impl SessionArgs {
    fn to_config(&self) -> ShareConfig {
        ShareConfig {
            region: RegionConfig {
                name: self.region.clone(),
                capacity: self.capacity,
                backing: self.file.clone().map_or(Backing::Shm, Backing::File),
                unlink_on_close: !self.keep_region,
            },
            token: TokenConfig {
                name: self.token.clone(),
                dir: self.lock_dir.clone().unwrap_or_else(default_lock_dir),
            },
            poll_interval: Duration::from_millis(self.poll_ms),
            probe_interval: Duration::from_millis(self.probe_ms),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Become the writer; every stdin line is a content change
    Writer {
        /// Append lines instead of replacing the content with each one
        #[arg(short, long)]
        append: bool,
    },

    /// Follow the writer's content until it exits
    Reader,

    /// Report whether a writer is running
    Status {
        /// Keep probing and report every change
        #[arg(short, long)]
        watch: bool,
    },

    /// Remove a region left behind by a writer run with --keep-region
    Clean,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.session.to_config();
    if let Err(e) = config.validate() {
        return report(&e.into());
    }

    let coordinator = RoleCoordinator::new(config);
    let result = match cli.command {
        Some(Commands::Writer { append }) => roles::run_writer(&coordinator, append),
        Some(Commands::Reader) => roles::run_reader(&coordinator),
        Some(Commands::Status { watch }) => roles::run_status(coordinator, watch),
        Some(Commands::Clean) => roles::run_clean(&coordinator),
        None => run_interactive_mode(&coordinator),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn report(error: &anyhow::Error) -> ExitCode {
    eprintln!("{} {error:#}", style("error:").red().bold());
    ExitCode::FAILURE
}

// ═══════════════════════════════════════════════════════════════════════════
// Interactive Mode
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum Choice {
    Writer,
    Reader,
    Refresh,
    Quit,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Writer => "✍  Writer",
            Self::Reader => "👀 Reader",
            Self::Refresh => "🔄 Check again",
            Self::Quit => "Quit",
        })
    }
}

fn run_interactive_mode(coordinator: &RoleCoordinator) -> Result<()> {
    print_header();

    loop {
        // A failed probe reads as "no writer"
        let state = coordinator.probe().unwrap_or_default();
        if state.writer_active {
            println!("{}", style("A writer is running (readers can be started)").green());
        } else {
            println!("{}", style("No writer is running").yellow());
        }

        let mut choices = Vec::new();
        if state.can_start_writer() {
            choices.push(Choice::Writer);
        }
        if state.can_start_reader() {
            choices.push(Choice::Reader);
        }
        choices.extend([Choice::Refresh, Choice::Quit]);

        let Ok(choice) = Select::new("Start as:", choices)
            .with_help_message("↑↓ to move, Enter to select")
            .prompt()
        else {
            return Ok(());
        };

        let outcome = match choice {
            Choice::Writer => roles::run_writer(coordinator, false),
            Choice::Reader => roles::run_reader(coordinator),
            Choice::Refresh => continue,
            Choice::Quit => return Ok(()),
        };

        // Losing a race or arriving too early only ends this attempt
        match outcome {
            Err(e) if e.downcast_ref::<ShareError>().is_some_and(ShareError::is_expected) => {
                println!("{} {e:#}", style("✗").red());
            }
            other => return other,
        }
        println!();
    }
}

fn print_header() {
    println!();
    println!("{}", style("═══════════════════════════════════════════").cyan());
    println!("{}", style("  mapshare - one writer, many readers").cyan().bold());
    println!("{}", style("═══════════════════════════════════════════").cyan());
    println!();
}
