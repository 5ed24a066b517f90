mod commands;
mod config;
mod console;
mod error;
mod feed;
mod identity;
mod ingest;
mod logging;
mod slug;
mod store;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;

use commands::Context;
use identity::IdentityKey;
use ingest::IngestOptions;
use logging::{LogConfig, LogLevel};

/// Ingest RSS/Atom feed documents into a local SQLite database
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Set the log level for the command
    #[arg(long = "log-level", value_enum, ignore_case = true, default_value_t = LogLevel::Warning)]
    log_level: LogLevel,

    /// Path to a file for logging
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a greeting and exit
    Main,
    /// Initialize the database
    Init {
        /// Path to the SQLite database file
        #[arg(long = "db", env = "PROMPTHOUND_DB")]
        db: Option<PathBuf>,
        /// Show what actions would be taken without making changes
        #[arg(long)]
        dry_run: bool,
        /// Re-initialize an existing database without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Ingest feed documents from files or stdin
    Ingest {
        /// Path to the SQLite database file
        #[arg(long = "db", env = "PROMPTHOUND_DB")]
        db: Option<PathBuf>,
        /// Comma-separated entry fields that identify an entry
        /// (title, link, description, published, guid)
        #[arg(long, env = "PROMPTHOUND_IDENTITY", default_value = "title,link,description")]
        identity: IdentityKey,
        /// Feed files to ingest; `-` or nothing reads stdin
        files: Vec<PathBuf>,
    },
    /// List ingested feeds with their entry counts
    Feeds {
        /// Path to the SQLite database file
        #[arg(long = "db", env = "PROMPTHOUND_DB")]
        db: Option<PathBuf>,
    },
}

fn run(ctx: &Context, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Main => commands::hello::cmd_hello(ctx),
        Command::Init { db, dry_run, yes } => {
            let db_path = config::resolve_db_path(db)?;
            commands::init::cmd_init(ctx, &db_path, dry_run, yes)
        }
        Command::Ingest {
            db,
            identity,
            files,
        } => {
            let db_path = config::resolve_db_path(db)?;
            commands::ingest::cmd_ingest(ctx, &db_path, &files, &IngestOptions { identity })
        }
        Command::Feeds { db } => {
            let db_path = config::resolve_db_path(db)?;
            commands::feeds::cmd_feeds(&db_path)
        }
    }
}

fn main() {
    let args = Args::parse();

    let log_config = LogConfig {
        level: args.log_level,
        log_file: args.log_file,
    };
    let _log_guard = match logging::init(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    let ctx = Context::new();
    if let Err(e) = run(&ctx, args.command) {
        let reason = format!("{e:#}");
        error!(error = %reason, "command failed");
        eprintln!("Error: {reason}");
        process::exit(1);
    }
}
