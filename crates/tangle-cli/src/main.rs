//! Tangle CLI - Command-line interface for Tangle
//!
//! Loads extractor batches into the fact store and answers structural
//! questions about the resulting dependency graph.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::Context;
use config::Config;

#[derive(Parser)]
#[command(name = "tangle")]
#[command(author = "Tangle Contributors")]
#[command(version)]
#[command(about = "Dependency graph queries over extracted import facts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to the nearest .tangle/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Tangle in a project directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Load an extraction batch into the store
    Load {
        /// Batch JSON produced by the extractor
        batch: PathBuf,

        /// Keep existing facts instead of replacing them
        #[arg(long)]
        append: bool,
    },

    /// Show store status and graph statistics
    Status,

    /// Show direct dependencies and dependents of a node
    Deps {
        /// Node id
        id: String,
    },

    /// Search nodes by id or name
    Find {
        /// Case-insensitive substring
        query: String,

        /// Maximum results to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Walk the dependency chain from a node
    Chain {
        /// Root node id
        id: String,

        /// Follow dependents instead of dependencies
        #[arg(long)]
        upstream: bool,

        /// Maximum depth
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Check whether two nodes are connected
    Connect {
        a: String,
        b: String,

        /// Maximum path length
        #[arg(long)]
        max_hops: Option<usize>,
    },

    /// Rank the most imported nodes
    Top {
        /// Number of nodes to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Rank by number of dependencies instead
        #[arg(long)]
        outgoing: bool,
    },

    /// List nodes with no edges at all
    Isolated,

    /// Group nodes by directory and show cross-group coupling
    Clusters {
        /// Number of groups and couplings to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Grouping: parent or top
        #[arg(long)]
        by: Option<tangle_graph::GroupBy>,
    },

    /// Print the dependency tree of a node
    Tree {
        /// Root node id
        id: String,

        /// Maximum depth
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// List circular dependencies
    Cycles,

    /// Export a size-bounded graph for visualization
    Project {
        /// Keep at most this many nodes
        #[arg(short, long)]
        max_nodes: Option<usize>,

        /// Keep every node
        #[arg(long, conflicts_with = "max_nodes")]
        all: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let ctx = Context {
        config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Init { path } => commands::init(&ctx, &path),
        Commands::Load { batch, append } => commands::load(&ctx, &batch, append),
        Commands::Status => commands::status(&ctx),
        Commands::Deps { id } => commands::deps(&ctx, &id),
        Commands::Find { query, limit } => commands::find(&ctx, &query, limit),
        Commands::Chain {
            id,
            upstream,
            depth,
        } => commands::chain(&ctx, &id, upstream, depth),
        Commands::Connect { a, b, max_hops } => commands::connect(&ctx, &a, &b, max_hops),
        Commands::Top { limit, outgoing } => commands::top(&ctx, limit, outgoing),
        Commands::Isolated => commands::isolated(&ctx),
        Commands::Clusters { limit, by } => commands::clusters(&ctx, limit, by),
        Commands::Tree { id, depth } => commands::tree(&ctx, &id, depth),
        Commands::Cycles => commands::cycles(&ctx),
        Commands::Project {
            max_nodes,
            all,
            output,
        } => commands::project(&ctx, max_nodes, all, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
