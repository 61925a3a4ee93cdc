//! Command-line interface for reading NextGIS Web vector layers.
//!
//! This binary opens an NGW connection string (`NGW:https://host`) with the
//! [`ngw_core`] driver and lists, describes, dumps or queries the layers it
//! exposes.
//!
//! # Available Commands
//!
//! - `drivers` - Show the driver and its capabilities
//! - `layers` - List the vector layers of a server
//! - `info` - Display the schema of one layer
//! - `dump` - Print the records of one layer
//! - `query` - Run SQL over layers with `DataFusion`

mod display;

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use datafusion::arrow::array::RecordBatch;
use datafusion::arrow::util::pretty::pretty_format_batches;
use datafusion::prelude::SessionContext;
use datafusion_ngw::{NgwFormatOptions, SessionContextNgwExt};
use ngw_core::{Catalog, Layer, NGW_DRIVER, NgwError, OpenOptions};
use tracing::{Level, debug, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use crate::display::{display_schema, drivers_table, layers_table, records_table};

#[derive(Parser)]
#[command(
    name = "ngw",
    version,
    about = "Read NextGIS Web vector layers",
    long_about = "Lists, describes, dumps and queries the vector layers of a NextGIS Web server.\n\
                  Connections are written as NGW:https://host (also NEXTGISWEB: or NEXTGIS:)."
)]
/// Command-line arguments and options for the `ngw` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Request timeout in seconds.
    #[arg(long, global = true, value_name = "SECONDS", default_value_t = 30)]
    timeout: u64,

    /// User-Agent header sent to the server.
    #[arg(long, global = true, value_name = "AGENT")]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the NGW driver and its capabilities.
    Drivers,

    /// Lists the vector layers of a server.
    Layers {
        /// NGW connection string.
        #[arg(value_name = "CONNECTION")]
        connection: String,
    },

    /// Displays the schema of one layer.
    Info {
        #[arg(value_name = "CONNECTION")]
        connection: String,

        /// Layer name (resource id).
        #[arg(short, long)]
        layer: String,
    },

    /// Prints the records of one layer.
    Dump {
        #[arg(value_name = "CONNECTION")]
        connection: String,

        /// Layer name (resource id).
        #[arg(short, long)]
        layer: String,

        /// Print at most this many records.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Runs a SQL query over layers registered as `layer_<id>` tables.
    Query {
        #[arg(value_name = "CONNECTION")]
        connection: String,

        /// SQL to run.
        #[arg(short, long)]
        sql: String,

        /// Layers to fetch (default: all).
        #[arg(short, long = "layer")]
        layers: Vec<String>,
    },
}

/// Entry point for the `ngw` command-line interface.
///
/// Reads go through blocking HTTP, so `main` stays synchronous and only the
/// `query` command starts a runtime, after every layer has been fetched.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let options = open_options(cli.timeout, cli.user_agent);

    match cli.command {
        Commands::Drivers => handle_drivers(),
        Commands::Layers { connection } => handle_layers(&connection, &options)?,
        Commands::Info { connection, layer } => handle_info(&connection, &layer, &options)?,
        Commands::Dump {
            connection,
            layer,
            limit,
        } => handle_dump(&connection, &layer, limit, &options)?,
        Commands::Query {
            connection,
            sql,
            layers,
        } => handle_query(&connection, &sql, &layers, &options)?,
    }

    Ok(())
}

fn open_options(timeout: u64, user_agent: Option<String>) -> OpenOptions {
    let options = OpenOptions::new().with_timeout(Duration::from_secs(timeout));
    match user_agent {
        Some(agent) => options.with_user_agent(agent),
        None => options,
    }
}

/// Open a catalog, turning driver errors into messages with a hint.
fn open_catalog(connection: &str, options: &OpenOptions) -> Result<Catalog> {
    info!("Opening {connection}");
    NGW_DRIVER.open(connection, options).map_err(describe)
}

fn describe(err: NgwError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\nHint: {hint}", err.user_message()),
        None => anyhow!(err.user_message()),
    }
}

fn find_layer<'a>(catalog: &'a mut Catalog, name: &str) -> Result<&'a mut Layer> {
    let layer = catalog
        .layer_by_name(name)
        .ok_or_else(|| anyhow!("Layer '{name}' not found."))?;
    layer.cache_schema().map_err(describe)?;
    Ok(layer)
}

fn handle_drivers() {
    println!("\nAvailable Drivers (1 total):\n");
    println!("{}", drivers_table(&[NGW_DRIVER]));
}

fn handle_layers(connection: &str, options: &OpenOptions) -> Result<()> {
    let mut catalog = open_catalog(connection, options)?;

    for index in 0..catalog.layer_count() {
        // schema failures are logged by the catalog; the row shows N/A
        let _ = catalog.layer(index);
    }

    let summary = catalog.summary();
    println!(
        "\nNextGIS Web {} (API {}): {} layer(s)\n",
        catalog.base_url(),
        catalog.api_version(),
        summary.layers
    );
    println!("{}", layers_table(catalog.layers()));
    debug!(
        "Skipped {} non-vector and {} malformed resource(s)",
        summary.non_vector_skipped, summary.parse_skipped
    );
    Ok(())
}

fn handle_info(connection: &str, layer_name: &str, options: &OpenOptions) -> Result<()> {
    let mut catalog = open_catalog(connection, options)?;
    let layer = find_layer(&mut catalog, layer_name)?;

    let schema = layer
        .schema()
        .context("schema missing after a successful fetch")?;
    display_schema(schema);
    if layer.skipped_fields() > 0 {
        warn!("{} field definition(s) could not be read", layer.skipped_fields());
    }
    Ok(())
}

fn handle_dump(
    connection: &str,
    layer_name: &str,
    limit: Option<usize>,
    options: &OpenOptions,
) -> Result<()> {
    let mut catalog = open_catalog(connection, options)?;
    let layer = find_layer(&mut catalog, layer_name)?;
    layer.reset_reading().map_err(describe)?;

    let mut records = Vec::new();
    while let Some(record) = layer.next_record() {
        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
        records.push(record);
    }

    let schema = layer
        .schema()
        .context("schema missing after a successful fetch")?;
    println!("{}", records_table(schema, &records));
    println!("{} record(s)", records.len());
    if layer.skipped_records() > 0 {
        warn!("{} feature(s) could not be read", layer.skipped_records());
    }
    Ok(())
}

fn handle_query(
    connection: &str,
    sql: &str,
    layer_names: &[String],
    options: &OpenOptions,
) -> Result<()> {
    let batches = run_query(connection, sql, layer_names, options)?;
    println!("{}", pretty_format_batches(&batches)?);
    Ok(())
}

/// Fetch the layers, register them and run `sql`.
///
/// Without explicit layer names every readable layer is registered; a named
/// layer that cannot be read is an error.
fn run_query(
    connection: &str,
    sql: &str,
    layer_names: &[String],
    options: &OpenOptions,
) -> Result<Vec<RecordBatch>> {
    let mut catalog = open_catalog(connection, options)?;

    if layer_names.is_empty() {
        // unreadable layers are left out of the query, not fatal
        for index in 0..catalog.layer_count() {
            let Some(layer) = catalog.layer(index) else {
                continue;
            };
            if layer.schema().is_none() {
                continue;
            }
            if let Err(err) = layer.reset_reading() {
                warn!("Layer {} skipped: {}", layer.name(), err.user_message());
            }
        }
    } else {
        for name in layer_names {
            let layer = find_layer(&mut catalog, name)?;
            layer.reset_reading().map_err(describe)?;
        }
    }

    let format_options = NgwFormatOptions::default();
    let ctx = SessionContext::new();
    let registered = ctx.register_ngw_catalog(&catalog, &format_options)?;
    info!("Registered {registered} table(s)");

    let runtime = tokio::runtime::Runtime::new()?;
    let batches = runtime.block_on(async { ctx.sql(sql).await?.collect().await })?;
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ngw_core::error::DriverError;
    use ngw_core::worker::VERSION_PATH;
    use ngw_core::{MemoryTransport, Transport};

    const LAYER_META: &str = r#"{
        "resource": {"display_name": "Wells"},
        "vector_layer": {"geometry_type": "POINT", "srs": {"id": 3857}},
        "feature_layer": {"fields": [{"keyname": "depth", "datatype": "REAL"}]}
    }"#;

    /// Layer 7 holds one feature, layer 8 has an empty feature collection.
    fn server_options() -> OpenOptions {
        let transport: Arc<dyn Transport> = Arc::new(
            MemoryTransport::new()
                .with_json(format!("http://ngw.test{VERSION_PATH}"), r#"{"nextgisweb": "4.0.0"}"#)
                .with_json(
                    "http://ngw.test/resource/store/",
                    r#"[{"cls": "vector_layer", "id": 7}, {"cls": "vector_layer", "id": 8}]"#,
                )
                .with_json("http://ngw.test/api/resource/7", LAYER_META)
                .with_json("http://ngw.test/api/resource/8", LAYER_META)
                .with_json(
                    "http://ngw.test/api/resource/7/feature/",
                    r#"[{"id": 1, "geom": "POINT (10 20)", "fields": {"depth": 12.5}}]"#,
                )
                .with_json("http://ngw.test/api/resource/8/feature/", "[]"),
        );
        OpenOptions::new().with_transport(transport)
    }

    #[test]
    fn test_open_options_from_flags() {
        let options = open_options(5, Some("probe/1.0".to_string()));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.user_agent, "probe/1.0");

        let defaults = open_options(30, None);
        assert!(defaults.user_agent.starts_with("ngw/"));
    }

    #[test]
    fn test_unrecognized_connection_has_hint() {
        let err = open_catalog("https://demo.nextgis.com", &OpenOptions::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("is not a NextGIS Web connection string"));
        assert!(message.contains("Hint: "));
    }

    #[test]
    fn test_describe_without_hint() {
        let err = describe(NgwError::from(DriverError::InvalidEndpoint {
            endpoint: "http://".to_string(),
            reason: "empty host".to_string(),
        }));
        assert!(!err.to_string().contains("Hint"));
    }

    #[test]
    fn test_cli_parses_query() {
        let cli = Cli::try_parse_from([
            "ngw",
            "query",
            "NGW:https://demo.nextgis.com",
            "--sql",
            "SELECT 1",
            "--layer",
            "7",
            "--layer",
            "9",
        ])
        .unwrap();
        match cli.command {
            Commands::Query { layers, .. } => assert_eq!(layers, vec!["7", "9"]),
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn test_query_all_layers_skips_empty_layer() {
        let batches = run_query(
            "NGW:http://ngw.test",
            "SELECT count(*) AS n FROM layer_7",
            &[],
            &server_options(),
        )
        .unwrap();
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 1);

        let missing = run_query("NGW:http://ngw.test", "SELECT * FROM layer_8", &[], &server_options());
        assert!(missing.is_err());
    }

    #[test]
    fn test_query_named_empty_layer_fails() {
        let err = run_query(
            "NGW:http://ngw.test",
            "SELECT * FROM layer_8",
            &["8".to_string()],
            &server_options(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("resource 8"));
    }
}
