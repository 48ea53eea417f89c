//! Synk CLI - Metadata store admin command line
//!
//! Inspects and edits the per-record timestamp metadata held in a
//! redb-backed Synk metadata store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use synk_codec::Meta;
use synk_common::SynkConfig;
use synk_metastore::{AsyncMetastore, MetaBackend, MemCache, Metastore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "synk-cli")]
#[command(about = "Synk metadata store admin CLI")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "synk.toml")]
    config: PathBuf,

    /// Path of the redb database (overrides config)
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Namespace to operate on (overrides config)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Log level (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the namespace into the cache and report how much fit
    Warm,
    /// Print the metadata of a record
    Get {
        /// Record ID
        id: String,
    },
    /// Add or update field timestamps of a record
    Stamp {
        /// Record ID
        id: String,
        /// Type identifier used when the record has no metadata yet
        #[arg(long)]
        clazz: String,
        /// Field stamps as FIELD=TIMESTAMP; the field ends at the first '=',
        /// so the timestamp may itself contain '='
        #[arg(required = true, value_parser = parse_stamp)]
        stamps: Vec<(String, String)>,
    },
    /// List records of the namespace in id order
    List {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
    /// Delete the metadata of a record
    Delete {
        /// Record ID
        id: String,
    },
}

/// Parse a `FIELD=TIMESTAMP` pair
///
/// Codec field keys never contain `=` (they may contain `|`), while
/// timestamps are opaque, so the split is at the first `=`.
fn parse_stamp(s: &str) -> Result<(String, String), String> {
    let (field, timestamp) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid stamp '{s}', expected FIELD=TIMESTAMP"))?;
    if field.is_empty() || timestamp.is_empty() {
        return Err(format!(
            "invalid stamp '{s}', field and timestamp must be non-empty"
        ));
    }
    Ok((field.to_string(), timestamp.to_string()))
}

/// Load the config file and apply command line overrides
fn load_config(args: &Args) -> Result<SynkConfig> {
    let mut config = SynkConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(path) = &args.data_path {
        config.metastore.data_path.clone_from(path);
    }
    if let Some(namespace) = &args.namespace {
        config.metastore.namespace.clone_from(namespace);
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    // One-shot commands warm explicitly when asked to
    config.metastore.warm_on_open = false;
    config.metastore.validate()?;
    Ok(config)
}

fn print_meta(id: &str, meta: &Meta) -> Result<()> {
    println!("Record: {id}");
    println!("{}", serde_json::to_string_pretty(meta)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Metastore::open(&config.metastore).with_context(|| {
        format!(
            "Failed to open metadata store at {}",
            config.metastore.data_path.display()
        )
    })?;
    let store = AsyncMetastore::new(store);
    let namespace = config.metastore.namespace.clone();

    match args.command {
        Commands::Warm => {
            let loaded = store.warm().await?;
            let ns = namespace.clone();
            let total = store
                .run(move |s| s.backend().count_for_namespace(&ns))
                .await?;
            println!("Namespace: {namespace}");
            println!("Rows:      {total}");
            println!("Cached:    {loaded}");
            println!("Capacity:  {}", store.blocking().cache().max_size());
        }
        Commands::Get { id } => match store.get_meta(id.clone()).await? {
            Some(meta) => print_meta(&id, &meta)?,
            None => println!("Record '{id}' not found in namespace '{namespace}'"),
        },
        Commands::Stamp { id, clazz, stamps } => {
            let mut meta = store
                .get_meta(id.clone())
                .await?
                .unwrap_or_else(|| Meta::new(clazz));
            for (field, timestamp) in stamps {
                meta.stamp(field, timestamp);
            }
            store.put_meta(id.clone(), meta.clone()).await?;
            info!(namespace = %namespace, id = %id, "Stamped record");
            print_meta(&id, &meta)?;
        }
        Commands::List { limit } => {
            let ns = namespace.clone();
            let rows = store
                .run(move |s| s.backend().all_for_namespace(&ns, limit))
                .await?;
            if rows.is_empty() {
                println!("No records found in namespace '{namespace}'");
            } else {
                println!("{:<40} {:<8} {:<40}", "ID", "FIELDS", "CLAZZ");
                println!("{}", "-".repeat(90));
                for row in rows {
                    match Meta::from_data_string(&row.data) {
                        Ok(meta) => println!("{:<40} {:<8} {:<40}", row.id, meta.len(), meta.clazz),
                        Err(e) => println!("{:<40} {:<8} <undecodable: {e}>", row.id, "-"),
                    }
                }
            }
        }
        Commands::Delete { id } => {
            let target = id.clone();
            if store.run(move |s| s.delete_meta(&target)).await? {
                println!("Deleted record '{id}' from namespace '{namespace}'");
            } else {
                println!("Record '{id}' not found in namespace '{namespace}'");
            }
        }
    }

    Ok(())
}
