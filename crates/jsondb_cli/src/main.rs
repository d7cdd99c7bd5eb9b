//! JsonDB CLI
//!
//! Command-line access to a JsonDB directory.
//!
//! # Commands
//!
//! - `list`, `get`, `create`, `update`, `delete` - Record operations
//! - `verify` - Read a collection without recovery
//! - `inspect` - Display collection metadata
//! - `keygen` - Print a fresh secret key

mod commands;

use clap::{Parser, Subcommand};
use commands::Target;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// JsonDB command-line tools.
#[derive(Parser)]
#[command(name = "jsondb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long, default_value = ".")]
    dir: PathBuf,

    /// Hex secret key, overriding the configured one
    #[arg(global = true, short, long)]
    key: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every record of a collection
    List {
        /// Collection name
        name: String,

        /// JSON schema file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Print one record
    Get {
        /// Collection name
        name: String,

        /// Record id
        id: String,

        /// JSON schema file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Create a record from a JSON object
    Create {
        /// Collection name
        name: String,

        /// Record fields, e.g. '{"name": "ann"}'
        json: String,

        /// JSON schema file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Merge a JSON object over a record
    Update {
        /// Collection name
        name: String,

        /// Record id
        id: String,

        /// Fields to change
        json: String,

        /// JSON schema file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Delete a record
    Delete {
        /// Collection name
        name: String,

        /// Record id
        id: String,

        /// JSON schema file
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Read a collection without recovery; fails on any problem
    Verify {
        /// Collection name
        name: String,
    },

    /// Display collection metadata
    Inspect {
        /// Collection name (all collections if omitted)
        name: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a fresh hex secret key
    Keygen,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr, command output to stdout
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let target = |name: String, schema: Option<PathBuf>| Target {
        dir: cli.dir.clone(),
        key: cli.key.clone(),
        name,
        schema,
    };

    match cli.command {
        Commands::List { name, schema } => {
            commands::records::list(&target(name, schema))?;
        }
        Commands::Get { name, id, schema } => {
            commands::records::get(&target(name, schema), &id)?;
        }
        Commands::Create { name, json, schema } => {
            commands::records::create(&target(name, schema), &json)?;
        }
        Commands::Update {
            name,
            id,
            json,
            schema,
        } => {
            commands::records::update(&target(name, schema), &id, &json)?;
        }
        Commands::Delete { name, id, schema } => {
            commands::records::delete(&target(name, schema), &id)?;
        }
        Commands::Verify { name } => {
            commands::verify::run(&target(name, None))?;
        }
        Commands::Inspect { name, format } => {
            commands::inspect::run(&cli.dir, cli.key.as_deref(), name.as_deref(), &format)?;
        }
        Commands::Keygen => {
            commands::keygen::run();
        }
        Commands::Version => {
            println!("JsonDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("JsonDB Core v{}", jsondb_core::VERSION);
        }
    }

    Ok(())
}
