//! intake CLI — the operator-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(
    name = "intake",
    version,
    about = "Student enrollment wizard and LLN assessment service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enrollment server
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the bind address (e.g. "0.0.0.0:8080")
        #[arg(long)]
        bind: Option<String>,
    },

    /// Validate a question bank TOML file
    Validate {
        /// Path to the bank file (validates the built-in bank if omitted)
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// Score a response file offline
    Score {
        /// Path to a JSON file mapping question ids to answers
        #[arg(long)]
        responses: PathBuf,

        /// Question bank override
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Administer student records
    Students {
        #[command(subcommand)]
        command: StudentsCommand,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and an example question bank
    Init,
}

#[derive(Subcommand)]
enum StudentsCommand {
    /// List registered students with attempt counts
    List,

    /// Reset a student's assessment attempts
    Reset {
        /// Student id
        #[arg(long)]
        id: Uuid,
    },

    /// Issue an admin token
    Token {
        /// Role name embedded in the token
        #[arg(long, default_value = "admin")]
        role: String,

        /// Comma-separated permissions
        #[arg(long, default_value = "manage-students")]
        permissions: String,

        /// Token lifetime in hours
        #[arg(long, default_value = "12")]
        ttl_hours: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, bind } => commands::serve::execute(config, bind).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Score {
            responses,
            bank,
            format,
        } => commands::score::execute(responses, bank, format),
        Commands::Students { command, config } => match command {
            StudentsCommand::List => commands::students::list(config).await,
            StudentsCommand::Reset { id } => commands::students::reset(config, id).await,
            StudentsCommand::Token {
                role,
                permissions,
                ttl_hours,
            } => commands::students::token(config, role, permissions, ttl_hours),
        },
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
