//! Portwarden CLI - Manage processes bound to network ports
//!
//! A command-line tool for inspecting the listening-port inventory,
//! killing owning processes, and managing favorites/watched ports.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portwarden")]
#[command(author, version, about = "Manage processes bound to network ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Filter by process name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Include inactive placeholders for favorites not currently bound
        #[arg(long)]
        all: bool,
    },

    /// Kill the process listening on a port
    Kill {
        /// Port number to free
        port: u16,

        /// Force kill (skip the graceful termination stage)
        #[arg(short, long)]
        force: bool,
    },

    /// Manage favorite ports
    #[command(alias = "fav")]
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Manage watched ports
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },

    /// Show current configuration
    Config,

    /// Watch the inventory live, printing changes and watch transitions
    Monitor {
        /// Refresh interval in seconds (defaults to the configured value)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Add a port to favorites
    Add { port: u16 },
    /// Remove a port from favorites
    #[command(alias = "rm")]
    Remove { port: u16 },
    /// List all favorite ports
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum WatchAction {
    /// Add a port to the watch list
    Add {
        port: u16,
        /// Notify when the port becomes active
        #[arg(long, default_value = "true")]
        on_start: bool,
        /// Notify when the port becomes inactive
        #[arg(long, default_value = "true")]
        on_stop: bool,
    },
    /// Remove a port from the watch list
    #[command(alias = "rm")]
    Remove { port: u16 },
    /// List all watched ports
    #[command(alias = "ls")]
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List { port, name, all }) => {
            commands::list::run(port, name, all, cli.json).await?;
        }
        Some(Commands::Kill { port, force }) => {
            commands::kill::run(port, force).await?;
        }
        Some(Commands::Favorites { action }) => match action {
            FavoritesAction::Add { port } => commands::favorites::add(port).await?,
            FavoritesAction::Remove { port } => commands::favorites::remove(port).await?,
            FavoritesAction::List => commands::favorites::list(cli.json).await?,
        },
        Some(Commands::Watch { action }) => match action {
            WatchAction::Add {
                port,
                on_start,
                on_stop,
            } => commands::watch::add(port, on_start, on_stop).await?,
            WatchAction::Remove { port } => commands::watch::remove(port).await?,
            WatchAction::List => commands::watch::list(cli.json).await?,
        },
        Some(Commands::Config) => {
            commands::config::show(cli.json).await?;
        }
        Some(Commands::Monitor { interval }) => {
            commands::monitor::run(interval).await?;
        }
        None => {
            commands::list::run(None, None, false, cli.json).await?;
        }
    }

    Ok(())
}
