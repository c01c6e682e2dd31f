//! Murmur CLI - Knowledge-base sync and social listeners.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Murmur - keep a brand knowledge base in sync and answer the feed
#[derive(Parser)]
#[command(name = "murmur")]
#[command(version)]
#[command(about = "Knowledge-base sync and social listeners", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize murmur (create config and database)
    Init,

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Sync monitored documents once
    Sync {
        /// Sync a single page instead of all configured ones
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Retrieve the fragments most similar to a query
    Query {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Filter by source type (notion, article)
        #[arg(short = 't', long)]
        source_type: Option<String>,
    },

    /// Ask a question grounded in the knowledge base
    Ask {
        /// Your question
        question: String,

        /// Number of context fragments to use
        #[arg(short, long)]
        context: Option<usize>,
    },

    /// Generate one standalone post draft from the knowledge base
    Draft,

    /// Run a polling listener
    #[command(subcommand)]
    Listen(ListenCommands),

    /// Review generated drafts
    #[command(subcommand)]
    Drafts(DraftCommands),

    /// Publish an approved draft
    Publish {
        /// Draft ID
        id: String,
    },

    /// Show knowledge-base statistics
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the active configuration
    Show,
    /// Print the config file path
    Path,
}

#[derive(Subcommand)]
enum ListenCommands {
    /// Poll the document source and sync changes
    Docs {
        /// Stop after N poll cycles (default: run until Ctrl+C)
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Poll the mentions feed and answer interactions
    Mentions {
        /// Publish replies immediately instead of drafting them
        #[arg(long)]
        auto_reply: bool,

        /// Stop after N poll cycles (default: run until Ctrl+C)
        #[arg(long)]
        iterations: Option<u64>,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// List drafts
    List {
        /// Filter by status (draft, posted, discarded)
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum drafts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show a draft in full
    Show {
        /// Draft ID
        id: String,
    },
    /// Discard a draft
    Discard {
        /// Draft ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Secrets (API keys, access tokens) come from the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(ConfigCommands::Show) => commands::config::show(),
        Commands::Config(ConfigCommands::Path) => commands::config::path(),
        Commands::Sync { page } => commands::sync::run(page).await,
        Commands::Query {
            query,
            limit,
            source_type,
        } => commands::query::run(&query, limit, source_type.as_deref()).await,
        Commands::Ask { question, context } => commands::ask::run(&question, context).await,
        Commands::Draft => commands::draft::run().await,
        Commands::Listen(ListenCommands::Docs { iterations }) => {
            commands::listen::docs(iterations).await
        }
        Commands::Listen(ListenCommands::Mentions {
            auto_reply,
            iterations,
        }) => commands::listen::mentions(auto_reply, iterations).await,
        Commands::Drafts(DraftCommands::List { status, limit }) => {
            commands::drafts::list(status.as_deref(), limit)
        }
        Commands::Drafts(DraftCommands::Show { id }) => commands::drafts::show(&id),
        Commands::Drafts(DraftCommands::Discard { id }) => commands::drafts::discard(&id),
        Commands::Publish { id } => commands::publish::run(&id).await,
        Commands::Stats => commands::stats::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
