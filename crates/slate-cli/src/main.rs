#![forbid(unsafe_code)]

mod cmd;
mod output;
mod store;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "slate: a task backlog manager with GitHub Issues sync",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize a slate project",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    slate init\n\n    # Emit machine-readable output\n    slate init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Create a new task",
        after_help = "EXAMPLES:\n    # Create a task\n    slate create --title \"Fix login timeout\"\n\n    # With metadata\n    slate create --title \"Fix login timeout\" --priority high --effort low\n\n    # Emit machine-readable output\n    slate create --title \"Fix login timeout\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        about = "List tasks",
        after_help = "EXAMPLES:\n    # List everything\n    slate list\n\n    # Filter by status and priority\n    slate list --status in_progress --priority high\n\n    # Emit machine-readable output\n    slate list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show one task",
        after_help = "EXAMPLES:\n    # Show a task\n    slate show sl-1a2b3c4d\n\n    # Use a short prefix when unique\n    slate show sl-1a\n\n    # Emit machine-readable output\n    slate show sl-1a2b3c4d --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Edit fields on a task",
        after_help = "EXAMPLES:\n    # Change status\n    slate update sl-1a2b --status review\n\n    # Emit machine-readable output\n    slate update sl-1a2b --priority low --json"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        about = "Mark a task ready to ship",
        after_help = "EXAMPLES:\n    # Complete a task\n    slate done sl-1a2b\n\n    # Emit machine-readable output\n    slate done sl-1a2b --json"
    )]
    Done(cmd::done::DoneArgs),

    #[command(
        about = "Reconcile with GitHub Issues",
        after_help = "EXAMPLES:\n    # Push local changes\n    slate sync --repo acme/widget\n\n    # Full two-way reconcile\n    slate sync --repo acme/widget --direction both\n\n    # Emit machine-readable output\n    slate sync --repo acme/widget --json"
    )]
    Sync(cmd::sync::SyncArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SLATE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "slate=debug,info"
        } else {
            "slate=info,warn"
        })
    });

    let format = env::var("SLATE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, output, &project_root),
        Commands::Create(args) => cmd::create::run_create(&args, output, &project_root),
        Commands::List(args) => cmd::list::run_list(&args, output, &project_root),
        Commands::Show(args) => cmd::show::run_show(&args, output, &project_root),
        Commands::Update(args) => cmd::update::run_update(&args, output, &project_root),
        Commands::Done(args) => cmd::done::run_done(&args, output, &project_root),
        Commands::Sync(args) => cmd::sync::run_sync(&args, output, &project_root),
    }
}
