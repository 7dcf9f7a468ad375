#![cfg(not(tarpaulin_include))]

use datatable::app;
use datatable::loader::load_rows;
use datatable::options::TableConfig;
use datatable::table::DataTable;
use log::info;
use std::env;

/// Main entry point for the table web host
///
/// Loads a table configuration and its rows, then serves the table's JSON
/// API until the process is stopped.
///
/// # Arguments
/// * `<config.json>` - Options and column definitions
/// * `<data.json|data.csv>` - Rows to display
/// * `[addr]` - Listen address, `127.0.0.1:3000` by default
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config.json> <data.json|data.csv> [addr]", args[0]);
        return Ok(());
    }
    let addr = args.get(3).map(String::as_str).unwrap_or("127.0.0.1:3000");

    let config = TableConfig::from_file(&args[1])?;
    let rows = load_rows(&args[2])?;
    info!(
        "Serving {} rows across {} columns",
        rows.len(),
        config.columns.len()
    );

    let table = DataTable::from_config(config, rows)
        .on_row_click(|row| info!("row clicked: {}", row))
        .on_column_visibility_change(|key, visible| {
            info!("column '{}' is now {}", key, if visible { "shown" } else { "hidden" })
        })
        .bulk_action("log", |rows| {
            for row in rows {
                info!("bulk action on {}", row);
            }
        });

    app::run(table, addr).await
}
