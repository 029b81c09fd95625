//! haulctl CLI - operator surface over the fleet data engine
//!
//! Stands in for the grid UI: every data operation goes through the same
//! coordinator channel a graphical frontend would drain, so this binary
//! exercises the exact contract the engine exposes:
//! - paginated listing and multi-criteria search (`list`, `search`)
//! - generic add/edit/delete against any table (`add`, `edit`, `delete`)
//! - schema introspection (`tables`, `columns`)
//! - dropdown resolution preview (`choices`)
//! - CSV export (`export`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

use haulctl_core::{load_dotenv, DbConfig, Pagination, Row};
use haulctl_data::{
    ConnectionManager, CrudEngine, FetchCoordinator, FkResolution, FkResolver, GridUpdate,
    SchemaCache,
};

mod export;
mod tracing_setup;

/// The single grid this frontend drives.
const GRID: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "haulctl", version, about = "Fleet data administration")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tables visible in the configured database
    Tables,
    /// Show a table's columns as introspected
    Columns { table: String },
    /// Fetch one page of rows with the total count
    List {
        table: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = haulctl_core::page::DEFAULT_PER_PAGE)]
        per_page: u32,
    },
    /// Search with Column=value filters, ANDed, matched as substrings
    Search {
        table: String,
        #[arg(required = true)]
        filters: Vec<String>,
    },
    /// Insert a record from Column=value pairs
    Add {
        table: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Update a record in place, keyed by its loaded identity value
    Edit {
        table: String,
        /// Identity value of the record being edited
        #[arg(long)]
        id: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Delete a record by identity value
    Delete {
        table: String,
        #[arg(long)]
        id: String,
    },
    /// Export a full table to CSV
    Export {
        table: String,
        /// Output file path
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Preview the dropdown choices a foreign-key column resolves to
    Choices { table: String, column: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(cli.debug)?;
    load_dotenv();

    let config = DbConfig::from_env().context("database configuration")?;
    let manager = Arc::new(ConnectionManager::connect(config).await);
    let cache = Arc::new(SchemaCache::new(manager.clone()));
    let engine = Arc::new(CrudEngine::new(manager.clone(), cache.clone()));
    let (coordinator, mut updates) = FetchCoordinator::new(engine.clone());
    tracing::debug!(pooled = manager.pooled(), "connection manager ready");

    let outcome = run(cli.command, &engine, &coordinator, &mut updates).await;
    manager.close().await;
    outcome
}

async fn run(
    command: Command,
    engine: &Arc<CrudEngine>,
    coordinator: &FetchCoordinator,
    updates: &mut UnboundedReceiver<GridUpdate>,
) -> Result<()> {
    match command {
        Command::Tables => {
            for table in engine.cache().tables().await? {
                println!("{table}");
            }
        }
        Command::Columns { table } => {
            let schema = engine.cache().schema(&table).await?;
            for column in &schema.columns {
                let null = if column.nullable { "NULL" } else { "NOT NULL" };
                println!("{}\t{}\t{}\t{}", column.name, column.sql_type, null, column.key);
            }
        }
        Command::List {
            table,
            page,
            per_page,
        } => {
            let handle =
                coordinator.ensure_loaded(GRID, &table, Pagination::new(page, per_page));
            if let Some(handle) = handle {
                handle.await.context("fetch task failed")?;
            }
            let columns = engine.cache().columns(&table).await;
            match next_update(updates).await? {
                GridUpdate::Rows { rows, total, .. } => {
                    render(&columns, &rows);
                    println!("page {page} of {total} total rows");
                }
                other => bail!("unexpected update: {other:?}"),
            }
        }
        Command::Search { table, filters } => {
            let criteria = parse_pairs(&filters)?;
            coordinator
                .search(GRID, &table, criteria)
                .await
                .context("search task failed")?;
            let columns = engine.cache().columns(&table).await;
            match next_update(updates).await? {
                GridUpdate::Rows { rows, total, .. } => {
                    render(&columns, &rows);
                    println!("{total} matching rows");
                }
                other => bail!("unexpected update: {other:?}"),
            }
        }
        Command::Add { table, fields } => {
            let (columns, values) = split_pairs(parse_pairs(&fields)?);
            coordinator
                .save(GRID, &table, columns, values, None)
                .await
                .context("save task failed")?;
            expect_write_done(updates).await?;
            println!("Record added");
        }
        Command::Edit { table, id, fields } => {
            let schema = engine.cache().schema(&table).await?;
            let id_column = schema
                .identity_column()
                .context("table has no columns")?
                .to_owned();
            let (columns, values) = split_pairs(parse_pairs(&fields)?);
            coordinator
                .save(GRID, &table, columns, values, Some((id_column, id)))
                .await
                .context("save task failed")?;
            expect_write_done(updates).await?;
            println!("Record updated");
        }
        Command::Delete { table, id } => {
            let schema = engine.cache().schema(&table).await?;
            let id_column = schema
                .identity_column()
                .context("table has no columns")?
                .to_owned();
            coordinator
                .delete(GRID, &table, id_column, id)
                .await
                .context("delete task failed")?;
            expect_write_done(updates).await?;
            println!("Record deleted");
        }
        Command::Export { table, out } => {
            let data = engine.fetch_all(&table).await?;
            let rows = export::write_csv(&out, &data)?;
            println!("Exported {rows} rows to {}", out.display());
        }
        Command::Choices { table, column } => {
            let resolver = FkResolver::new(engine.clone());
            match resolver.resolve(&table, &column).await {
                FkResolution::Resolved(choices) | FkResolution::BareKeys(choices) => {
                    for option in &choices.options {
                        println!("{option}");
                    }
                }
                FkResolution::FreeText => {
                    println!("(free text - no dropdown for {column})");
                }
            }
        }
    }
    Ok(())
}

/// Take the single update a dispatched task posts back.
async fn next_update(updates: &mut UnboundedReceiver<GridUpdate>) -> Result<GridUpdate> {
    match updates.recv().await {
        Some(GridUpdate::Failed { message, .. }) => bail!("{message}"),
        Some(update) => Ok(update),
        None => bail!("coordinator channel closed"),
    }
}

async fn expect_write_done(updates: &mut UnboundedReceiver<GridUpdate>) -> Result<()> {
    match next_update(updates).await? {
        GridUpdate::WriteDone { ok: true, .. } => Ok(()),
        other => bail!("unexpected update: {other:?}"),
    }
}

/// Parse `Column=value` arguments, keeping order.
fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((column, value)) => Ok((column.to_owned(), value.to_owned())),
            None => bail!("expected Column=value, got {arg:?}"),
        })
        .collect()
}

fn split_pairs(pairs: Vec<(String, String)>) -> (Vec<String>, Vec<String>) {
    pairs.into_iter().unzip()
}

/// Print rows under their header with per-column widths.
fn render(columns: &[String], rows: &[Row]) {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if idx < widths.len() {
                widths[idx] = widths[idx].max(cell.len());
            } else {
                widths.push(cell.len());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| format!("{cell:<width$}", width = widths.get(idx).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
    };

    if !columns.is_empty() {
        println!("{}", line(columns));
        println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    }
    for row in rows {
        println!("{}", line(row));
    }
}
