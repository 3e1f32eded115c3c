//! tether CLI
//!
//! Operator-side client for a remote control plane: attach an interactive
//! terminal or a live log tail to a microservice or agent over a single
//! message-framed WebSocket session.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tether::commands::{self, LogsRequest};
use tether::context::AppContext;
use tether::output::print_error;
use tether::urls::TAIL_DEFAULT;

#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about = "Attach terminals and log streams to remote compute units")]
#[command(propagate_version = true)]
struct Cli {
    /// Namespace to operate in
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,

    /// Path to the namespace configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach an interactive terminal to a running microservice or agent
    Attach {
        /// Target name
        target: String,

        /// Treat the target as an agent instead of a microservice
        #[arg(short, long)]
        agent: bool,
    },

    /// Stream logs from a microservice or agent
    Logs {
        /// Target name
        target: String,

        /// Treat the target as an agent instead of a microservice
        #[arg(short, long)]
        agent: bool,

        /// Treat the target as a system microservice
        #[arg(long, conflicts_with = "agent")]
        system: bool,

        /// Historical lines to request (1-10000)
        #[arg(long, default_value_t = TAIL_DEFAULT)]
        tail: u32,

        /// Stop after the historical lines instead of following
        #[arg(long)]
        no_follow: bool,

        /// Only logs at or after this RFC3339 timestamp
        #[arg(long)]
        since: Option<String>,

        /// Only logs before this RFC3339 timestamp
        #[arg(long)]
        until: Option<String>,
    },

    /// Reconcile local agent records with the controller inventory
    Sync,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::init(cli.namespace, cli.config)?;

    match cli.command {
        Commands::Attach { target, agent } => commands::attach_command(&ctx, &target, agent).await,
        Commands::Logs {
            target,
            agent,
            system,
            tail,
            no_follow,
            since,
            until,
        } => {
            commands::logs_command(
                &ctx,
                LogsRequest {
                    target,
                    agent,
                    system,
                    tail,
                    follow: !no_follow,
                    since,
                    until,
                },
            )
            .await
        }
        Commands::Sync => commands::sync_command(&ctx).await,
    }
}
