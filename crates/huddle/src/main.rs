//! huddle - drive a hosted meeting-assistant agent from the terminal

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    init_command, provision_command, run_command, status_command, threads_forget_command,
    threads_list_command,
};

/// huddle - calendar, recording and email assistant on a hosted agent platform
#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "◆ Drive a hosted meeting-assistant agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and example tool manifest
    Init,
    /// Create the remote agent and attach the manifest tools
    Provision,
    /// Run a task on the agent
    Run {
        /// Task to send (interactive mode when omitted)
        #[arg(short, long)]
        message: Option<String>,
        /// Session name; runs in the same session share a memory thread
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Start a new thread instead of resuming the session's
        #[arg(long)]
        fresh: bool,
        /// Extra instructions appended to the system prompt
        #[arg(short, long)]
        instructions: Option<String>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Manage remembered memory threads
    Threads {
        #[command(subcommand)]
        command: ThreadCommands,
    },
    /// Show configuration status
    Status,
}

#[derive(Subcommand)]
enum ThreadCommands {
    /// List sessions and their threads
    List,
    /// Forget a session's thread
    Forget { session: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if matches!(cli.command, Commands::Run { verbose: true, .. }) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Provision => provision_command().await,
        Commands::Run {
            message,
            session,
            fresh,
            instructions,
            verbose: _,
        } => run_command(message, session, fresh, instructions).await,
        Commands::Threads { command } => match command {
            ThreadCommands::List => threads_list_command().await,
            ThreadCommands::Forget { session } => threads_forget_command(session).await,
        },
        Commands::Status => status_command().await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
