mod display;
mod input;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;
use wellnotes_comments::CommentStore;
use wellnotes_core::WellnotesConfig;
use wellnotes_core::config::CONFIG_ENV;
use wellnotes_store::DuckService;

#[derive(Parser)]
#[command(name = "wellnotes", version, about = "Well annotation log for production dashboards")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, env = CONFIG_ENV, global = true)]
    config: Option<PathBuf>,

    /// Comment log locator (bare path or `... path=<dir>`). Overrides the config.
    #[arg(long, global = true)]
    log: Option<String>,

    /// Entity key columns, comma-separated. Overrides the config.
    #[arg(long, value_delimiter = ',', global = true)]
    keys: Option<Vec<String>>,

    /// Partition/version tag passed to the snapshot query.
    #[arg(long, global = true)]
    salt: Option<i64>,

    /// DuckDB database file. In-memory when omitted.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log at DEBUG level, including table dumps.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the latest annotation per entity.
    Snapshot,
    /// Show every annotation ever saved, oldest first.
    History {
        /// Restrict to one entity: key values in key order, comma-separated.
        #[arg(long, value_delimiter = ',')]
        entity: Option<Vec<String>>,
    },
    /// Attach the latest annotations to a Parquet result table.
    Merge {
        /// Parquet file with the entity key columns.
        table: PathBuf,
    },
    /// Append edited annotations from a JSON array of rows.
    Save {
        /// JSON file: `[{"__deposit": "A", "comment": "..."}, ...]`.
        rows: PathBuf,
        /// Provenance label stored with each row.
        #[arg(long)]
        source: String,
        /// Editor identity stored with each row.
        #[arg(long)]
        user: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("wellnotes v{}", env!("CARGO_PKG_VERSION"));

    let mut config = WellnotesConfig::resolve(cli.config.as_deref())?;
    if let Some(log) = cli.log {
        config.comments.source = log;
    }
    if let Some(keys) = cli.keys {
        config.comments.keys = keys;
    }
    if let Some(salt) = cli.salt {
        config.comments.salt = salt;
    }
    if cli.database.is_some() {
        config.database = cli.database;
    }

    let service = match &config.database {
        Some(path) => DuckService::open_persistent(path)
            .with_context(|| format!("opening {}", path.display()))?,
        None => DuckService::open()?,
    };
    let store = CommentStore::from_config(&service, &config.comments);

    match cli.command {
        Command::Snapshot => match store.snapshot() {
            Some(snapshot) => display::print_table("Latest comments", snapshot)?,
            None => anyhow::bail!("comment snapshot could not be loaded from {}", store.path()),
        },
        Command::History { entity } => {
            let history = store.list_all().context("reading comment history")?;
            let history = match entity {
                Some(values) => {
                    let values: Vec<&str> = values.iter().map(String::as_str).collect();
                    store.filter_entity(&history, &values)?
                }
                None => history,
            };
            display::print_table("Comment history", &history)?;
        }
        Command::Merge { table } => {
            let rows = input::read_table(&table)?;
            let merged = store.merge(&rows)?;
            display::print_table("Merged", &merged)?;
        }
        Command::Save { rows, source, user } => {
            let rows = input::read_json(&rows)?;
            let receipt = store.save(&rows, &source, &user)?;
            println!(
                "appended {} of {} rows to {}",
                receipt.appended,
                rows.num_rows(),
                store.path()
            );
        }
    }

    Ok(())
}
