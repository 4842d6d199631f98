use clap::{Parser, Subcommand};
use life_agent_core::Domain;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "life-agent-cli", version, about = "Life agent accountability CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commitment logging and completion
    Commit {
        #[command(subcommand)]
        action: commands::commit::CommitAction,
    },
    /// Completion and avoidance patterns
    Analyze {
        #[arg(long)]
        user: i64,
        /// Window in days (defaults to analysis.default_window_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Predict whether a commitment will be completed
    Predict {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        domain: Domain,
        /// Commitment text
        text: String,
    },
    /// Domains with momentum or excellence
    Success {
        #[arg(long)]
        user: i64,
    },
    /// Scan a message for avoidance language
    Scan {
        #[arg(long)]
        user: i64,
        /// Domain the message belongs to (general when omitted)
        #[arg(long)]
        domain: Option<Domain>,
        /// Message text
        text: String,
    },
    /// Run every detection and escalate interventions
    Check {
        #[arg(long)]
        user: i64,
    },
    /// Intervention management
    Intervention {
        #[command(subcommand)]
        action: commands::intervention::InterventionAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Commit { action } => commands::commit::run(action),
        Commands::Analyze { user, days } => commands::analyze::analyze(user, days),
        Commands::Predict { user, domain, text } => commands::analyze::predict(user, domain, &text),
        Commands::Success { user } => commands::analyze::success(user),
        Commands::Scan { user, domain, text } => commands::scan::run(user, domain, &text),
        Commands::Check { user } => commands::check::run(user),
        Commands::Intervention { action } => commands::intervention::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
