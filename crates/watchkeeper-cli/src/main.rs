use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{clear, config, list, owners, serve, status, sync};
use watchkeeper_config::{load_dotenv, PathManager};

mod api;
mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchkeeper")]
#[command(about = "Watchkeeper - know which watchlist titles your media server already has")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass
    #[command(long_about = "Fetch the watchlist, scan every library of the configured media server, and replace the stored snapshot. Titles that became available since the previous pass trigger a notification.")]
    Sync {
        /// Run the pass without writing the snapshot or sending notifications
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Serve the HTTP API and sync on a schedule
    #[command(long_about = "Run in the foreground: expose the snapshot over HTTP and run a pass every configured interval. A pass also runs on startup unless disabled.")]
    Serve {
        /// Skip the initial sync on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Address to listen on (overrides api.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Show the stored snapshot
    List {
        /// Only titles not found on the server
        #[arg(long, action = ArgAction::SetTrue)]
        missing: bool,
    },
    /// Show the outcome of the last pass
    Status,
    /// Show or set who wants a title
    #[command(long_about = "Without names, print the owners of an entry. With names, replace them. Owners survive later passes as long as the title stays on the watchlist.")]
    Owners {
        /// Entry id as shown by 'list --output json'
        id: String,

        /// Owner names
        names: Vec<String>,

        /// Remove all owners
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "names")]
        clear: bool,
    },
    /// Configure credentials and settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Remove stored data
    Clear {
        /// Remove the snapshot and credentials
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Remove the stored snapshot and sync status
        #[arg(long, action = ArgAction::SetTrue)]
        snapshot: bool,

        /// Remove stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Do not ask for confirmation
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Choose the media server to reconcile against
    Server {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        language: Option<String>,
    },
    /// Store the Plex account token
    Plex {
        /// Plex token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,
    },
    /// Store the TMDB API key used for ratings
    Tmdb {
        #[arg(long)]
        api_key: Option<String>,

        /// Turn rating lookups off
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "api_key")]
        disable: bool,
    },
    /// Configure Telegram notifications
    Telegram {
        #[arg(long)]
        bot_token: Option<String>,

        #[arg(long)]
        chat_id: Option<String>,

        /// Turn notifications off
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["bot_token", "chat_id"])]
        disable: bool,
    },
    /// Configure the sync schedule used by 'serve'
    Scheduler {
        #[arg(long)]
        interval_secs: Option<u64>,

        #[arg(long)]
        run_on_startup: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    load_dotenv();

    let cli = Cli::parse();

    let init = if matches!(cli.command, Commands::Serve { .. }) {
        let paths = PathManager::default();
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create directories: {}", e))?;
        logging::init_logging_with_file(cli.verbose, cli.quiet, Some(&paths.server_log_file()))
    } else {
        logging::init_logging(cli.verbose, cli.quiet)
    };
    init.map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { dry_run } => sync::run_sync(dry_run, &output).await,
        Commands::Serve { no_startup_sync, bind } => serve::run_serve(no_startup_sync, bind, &output).await,
        Commands::List { missing } => list::run_list(missing, &output).await,
        Commands::Status => status::run_status(&output).await,
        Commands::Owners { id, names, clear } => owners::run_owners(id, names, clear, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
        Commands::Clear {
            all,
            snapshot,
            credentials,
            yes,
        } => clear::run_clear(all, snapshot, credentials, yes, &output).await,
    }
}
