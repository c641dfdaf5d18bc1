use anyhow::Result;
use clap::{Parser, Subcommand};
use cynefin_core::session::CynefinDomain;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::history::RecordArgs;
use commands::utils::StoreOptions;

#[derive(Parser)]
#[command(name = "cynefin")]
#[command(about = "Cynefin CLI - browse and manage the analysis session history", long_about = None)]
struct Cli {
    /// Keep config and history under this directory instead of the platform defaults
    #[arg(long, global = true, env = "CYNEFIN_ROOT")]
    root: Option<PathBuf>,

    /// Override the configured history cap for this invocation
    #[arg(long, global = true)]
    cap: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sessions, newest first
    List {
        /// Only sessions whose query contains this text
        #[arg(long)]
        text: Option<String>,
        /// Only sessions classified into this domain
        #[arg(long)]
        domain: Option<CynefinDomain>,
        /// Only sessions carrying this tag
        #[arg(long)]
        tag: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one session with its full result
    Show { id: String },
    /// Record a completed session
    Record(RecordArgs),
    /// Delete a session
    Delete { id: String },
    /// Delete every session
    Clear,
    /// Write the whole history as a JSON snapshot
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore sessions from a JSON snapshot
    Import { file: PathBuf },
    /// Show history counts
    Stats,
    /// Remove stored results no session refers to
    Compact,
    /// Inspect or change the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Persist a new history cap
    SetCap { cap: usize },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = StoreOptions {
        root: cli.root,
        cap: cli.cap,
    };

    match cli.command {
        Commands::List {
            text,
            domain,
            tag,
            json,
        } => commands::history::list(&options, text, domain, tag, json)?,
        Commands::Show { id } => commands::history::show(&options, &id)?,
        Commands::Record(args) => commands::history::record(&options, args)?,
        Commands::Delete { id } => commands::history::delete(&options, &id)?,
        Commands::Clear => commands::history::clear(&options)?,
        Commands::Export { output } => commands::transfer::export(&options, output.as_deref())?,
        Commands::Import { file } => commands::transfer::import(&options, &file)?,
        Commands::Stats => commands::history::stats(&options)?,
        Commands::Compact => commands::history::compact(&options)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&options)?,
            ConfigAction::SetCap { cap } => commands::config::set_cap(&options, cap)?,
        },
    }

    Ok(())
}
