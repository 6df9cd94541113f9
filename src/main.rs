use anyhow::{Context, Result};
use catalog_bridge::config::{find_config_file, get_config, load_config, Config};
use catalog_bridge::ils::{IlsDriver, OleDriver};
use catalog_bridge::models::{HoldDetails, ParamBag, Patron, Query, RecordCollection, RenewDetails};
use catalog_bridge::search::{SearchBackend, SolrBackend, DEFAULT_BROWSE_LIMIT};
use catalog_bridge::utils::display::{self, profile_fields, render_fields, render_table, TableRow};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Catalog Bridge - Query a Solr discovery index and a Kuali OLE catalog
#[derive(Parser, Debug)]
#[command(name = "catalog-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query a Solr discovery index and a Kuali OLE catalog", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the discovery index
    #[command(alias = "s")]
    Search {
        /// Query string; empty matches everything
        #[arg(default_value = "")]
        query: String,

        /// Field the query is scoped to
        #[arg(long)]
        handler: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: u64,

        #[arg(long, short, default_value_t = 20)]
        limit: u64,

        /// Ask for spelling suggestions on this text
        #[arg(long)]
        spellcheck: Option<String>,
    },

    /// Fetch one record by id
    Record { id: String },

    /// Fetch many records by id
    Batch {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Records similar to the given one
    Similar { id: String },

    /// Index terms of a field
    Terms {
        field: String,

        /// Start after this term
        #[arg(long, default_value = "")]
        start: String,

        #[arg(long, short, default_value_t = 20)]
        limit: u64,
    },

    /// Page through an alphabetic browse index
    Browse {
        /// Browse index name, e.g. title or author
        source: String,

        /// Starting point
        from: String,

        #[arg(long, default_value_t = 0)]
        page: u64,

        #[arg(long, short, default_value_t = DEFAULT_BROWSE_LIMIT)]
        limit: u64,
    },

    /// Items of a record
    Holding {
        id: String,

        /// Use the docstore holdings tree instead of the index
        #[arg(long)]
        tree: bool,
    },

    /// Item statuses of several records
    Statuses {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Patron profile
    Profile {
        #[arg(long)]
        patron: String,
    },

    /// Checked out items
    Transactions {
        #[arg(long)]
        patron: String,
    },

    /// Requests placed by a patron
    Holds {
        #[arg(long)]
        patron: String,
    },

    /// Outstanding fines
    Fines {
        #[arg(long)]
        patron: String,
    },

    /// Place a hold on an item
    PlaceHold {
        #[arg(long)]
        patron: String,

        /// Record id
        #[arg(long)]
        id: String,

        #[arg(long)]
        barcode: String,
    },

    /// Renew checked out items
    Renew {
        #[arg(long)]
        patron: String,

        /// Items as `<barcode>,<id>`
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Configured pickup locations
    PickupLocations,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("catalog_bridge={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file if specified or found in default locations
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path).with_context(|| format!("Failed to load {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()
    };

    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    config.validate()?;

    let format = resolve_format(cli.output);

    match cli.command {
        Commands::Search {
            query,
            handler,
            offset,
            limit,
            spellcheck,
        } => {
            let backend = search_backend(&config)?;
            let mut query = Query::new(query);
            if let Some(handler) = handler {
                query = query.with_handler(handler);
            }
            let params = spellcheck.map(|text| ParamBag::from_pairs([("spellcheck.q", text)]));
            let collection = backend.search(&query, offset, limit, params).await?;
            output_collection(&collection, format)?;
        }
        Commands::Record { id } => {
            let collection = search_backend(&config)?.retrieve(&id, None).await?;
            output_collection(&collection, format)?;
        }
        Commands::Batch { ids } => {
            let collection = search_backend(&config)?.retrieve_batch(&ids, None).await?;
            output_collection(&collection, format)?;
        }
        Commands::Similar { id } => {
            let collection = search_backend(&config)?.similar(&id, None).await?;
            output_collection(&collection, format)?;
        }
        Commands::Terms { field, start, limit } => {
            let terms = search_backend(&config)?.terms(&field, &start, limit, None).await?;
            output_rows(terms.field(&field), format)?;
        }
        Commands::Browse {
            source,
            from,
            page,
            limit,
        } => {
            let result = search_backend(&config)?
                .alphabetic_browse(&source, &from, page, limit, None)
                .await?;
            // Browse pages have no fixed shape
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Holding { id, tree } => {
            let driver = ils_driver(&config)?;
            let items = if tree {
                driver.get_holding_tree(&id).await?
            } else {
                driver.get_holding(&id).await?
            };
            output_rows(&items, format)?;
        }
        Commands::Statuses { ids } => {
            let statuses = ils_driver(&config)?.get_statuses(&ids).await?;
            let items: Vec<_> = statuses.into_iter().flatten().collect();
            output_rows(&items, format)?;
        }
        Commands::Profile { patron } => {
            let profile = ils_driver(&config)?.get_my_profile(&Patron::with_id(patron)).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
                _ => println!("{}", render_fields(&profile_fields(&profile))),
            }
        }
        Commands::Transactions { patron } => {
            let transactions = ils_driver(&config)?
                .get_my_transactions(&Patron::with_id(patron))
                .await?;
            output_rows(&transactions, format)?;
        }
        Commands::Holds { patron } => {
            let holds = ils_driver(&config)?.get_my_holds(&Patron::with_id(patron)).await?;
            output_rows(&holds, format)?;
        }
        Commands::Fines { patron } => {
            let fines = ils_driver(&config)?.get_my_fines(&Patron::with_id(patron)).await?;
            output_rows(&fines, format)?;
        }
        Commands::PlaceHold { patron, id, barcode } => {
            let details = HoldDetails {
                patron: Patron::with_id(patron),
                id,
                barcode,
            };
            let result = ils_driver(&config)?.place_hold(&details).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => {
                    let status = if result.success { "placed" } else { "refused" };
                    println!("Hold {}: {}", status, result.sys_message);
                }
            }
        }
        Commands::Renew { patron, items } => {
            let details = RenewDetails {
                patron: Patron::with_id(patron),
                details: items,
            };
            let results = ils_driver(&config)?.renew_my_items(&details).await?;
            output_rows(&results.details, format)?;
        }
        Commands::PickupLocations => {
            output_rows(&ils_driver(&config)?.get_pickup_locations(), format)?;
        }
    }

    Ok(())
}

fn search_backend(config: &Config) -> Result<SolrBackend> {
    if config.search.url.is_empty() {
        anyhow::bail!("search.url is not configured");
    }
    Ok(SolrBackend::from_config(config)?)
}

fn ils_driver(config: &Config) -> Result<OleDriver> {
    Ok(OleDriver::new(config)?)
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if display::is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn output_rows<T: Serialize + TableRow>(rows: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        _ => println!("{}", render_table(rows)),
    }
    Ok(())
}

fn output_collection(collection: &RecordCollection, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(collection)?);
        return Ok(());
    }

    println!("{}", render_table(&collection.records));
    println!(
        "{} of {} results (offset {})",
        collection.len(),
        collection.total,
        collection.offset
    );
    for suggestion in &collection.spellcheck.suggestions {
        println!("Did you mean: {} -> {}", suggestion.term, suggestion.suggestions.join(", "));
    }
    Ok(())
}
