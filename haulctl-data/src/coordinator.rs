//! Background fetch coordination.
//!
//! The UI thread never touches the database: every user-triggered fetch,
//! search or write runs in its own spawned task, and exactly one update
//! per task is posted through the channel the UI thread drains. Nothing
//! is cancelled once dispatched; two in-flight fetches on one grid both
//! complete and both post, and the grid shows whichever posted last.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use haulctl_core::{Pagination, Row};

use crate::source::DataSource;

/// Fetch lifecycle of one UI-visible grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// One result posted back to the UI thread, mirroring the callback surface
/// the grids consume: rows plus count, a write outcome, or a message.
#[derive(Debug, Clone, Serialize)]
pub enum GridUpdate {
    Rows {
        grid: String,
        rows: Vec<Row>,
        total: i64,
    },
    WriteDone {
        grid: String,
        ok: bool,
    },
    Failed {
        grid: String,
        message: String,
    },
}

type GridStates = Arc<Mutex<HashMap<String, GridState>>>;

/// Dispatches data-access calls off the calling thread and marshals
/// results back through a single channel.
///
/// The returned handles can be awaited, ignored, or wrapped in whatever
/// cancellation the host wants; the coordinator itself never cancels.
pub struct FetchCoordinator {
    source: Arc<dyn DataSource>,
    states: GridStates,
    tx: UnboundedSender<GridUpdate>,
}

impl FetchCoordinator {
    /// Build a coordinator and the receiving end the UI thread drains.
    pub fn new(source: Arc<dyn DataSource>) -> (Self, UnboundedReceiver<GridUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                source,
                states: Arc::new(Mutex::new(HashMap::new())),
                tx,
            },
            rx,
        )
    }

    /// Current fetch state of a grid.
    pub fn state(&self, grid: &str) -> GridState {
        self.states
            .lock()
            .expect("grid state lock poisoned")
            .get(grid)
            .copied()
            .unwrap_or(GridState::Unloaded)
    }

    /// First activation of a grid: transitions `Unloaded -> Loading` and
    /// dispatches the initial fetch exactly once. Returns `None` if the
    /// grid was already activated; hidden tabs simply never call this.
    pub fn ensure_loaded(&self, grid: &str, table: &str, page: Pagination) -> Option<JoinHandle<()>> {
        {
            let mut states = self.states.lock().expect("grid state lock poisoned");
            match states.get(grid) {
                None => {
                    states.insert(grid.to_owned(), GridState::Loading);
                }
                Some(_) => return None,
            }
        }
        debug!(grid, table, "lazy activation");
        Some(self.spawn_fetch(grid, table, page))
    }

    /// Refresh a grid: any current state moves to `Loading` and a new
    /// fetch is dispatched. An in-flight fetch is not cancelled; both
    /// post, last writer wins.
    pub fn refresh(&self, grid: &str, table: &str, page: Pagination) -> JoinHandle<()> {
        set_state(&self.states, grid, GridState::Loading);
        self.spawn_fetch(grid, table, page)
    }

    /// Filtered fetch; posts the full filtered set with its own length as
    /// the count.
    pub fn search(&self, grid: &str, table: &str, criteria: Vec<(String, String)>) -> JoinHandle<()> {
        set_state(&self.states, grid, GridState::Loading);
        let source = self.source.clone();
        let states = self.states.clone();
        let tx = self.tx.clone();
        let grid = grid.to_owned();
        let table = table.to_owned();
        tokio::spawn(async move {
            match source.search_multi(&table, &criteria).await {
                Ok(rows) => {
                    set_state(&states, &grid, GridState::Loaded);
                    let total = rows.len() as i64;
                    post(&tx, GridUpdate::Rows { grid, rows, total });
                }
                Err(err) => {
                    set_state(&states, &grid, GridState::Error);
                    post(
                        &tx,
                        GridUpdate::Failed {
                            grid,
                            message: err.to_string(),
                        },
                    );
                }
            }
        })
    }

    /// Insert or update depending on whether an identity from a loaded
    /// record is supplied.
    pub fn save(
        &self,
        grid: &str,
        table: &str,
        columns: Vec<String>,
        values: Vec<String>,
        loaded_id: Option<(String, String)>,
    ) -> JoinHandle<()> {
        let source = self.source.clone();
        let tx = self.tx.clone();
        let grid = grid.to_owned();
        let table = table.to_owned();
        tokio::spawn(async move {
            let result = match &loaded_id {
                Some((id_column, id_value)) => {
                    source
                        .update(&table, &columns, values, id_column, id_value)
                        .await
                }
                None => source.insert(&table, &columns, values).await,
            };
            match result {
                Ok(()) => post(&tx, GridUpdate::WriteDone { grid, ok: true }),
                Err(err) => post(
                    &tx,
                    GridUpdate::Failed {
                        grid,
                        message: err.to_string(),
                    },
                ),
            }
        })
    }

    /// Delete one record.
    pub fn delete(&self, grid: &str, table: &str, id_column: String, id_value: String) -> JoinHandle<()> {
        let source = self.source.clone();
        let tx = self.tx.clone();
        let grid = grid.to_owned();
        let table = table.to_owned();
        tokio::spawn(async move {
            match source.delete(&table, &id_column, &id_value).await {
                Ok(()) => post(&tx, GridUpdate::WriteDone { grid, ok: true }),
                Err(err) => post(
                    &tx,
                    GridUpdate::Failed {
                        grid,
                        message: err.to_string(),
                    },
                ),
            }
        })
    }

    fn spawn_fetch(&self, grid: &str, table: &str, page: Pagination) -> JoinHandle<()> {
        let source = self.source.clone();
        let states = self.states.clone();
        let tx = self.tx.clone();
        let grid = grid.to_owned();
        let table = table.to_owned();
        tokio::spawn(async move {
            match source.fetch_page(&table, page).await {
                Ok(paged) => {
                    set_state(&states, &grid, GridState::Loaded);
                    post(
                        &tx,
                        GridUpdate::Rows {
                            grid,
                            rows: paged.items,
                            total: paged.total,
                        },
                    );
                }
                Err(err) => {
                    set_state(&states, &grid, GridState::Error);
                    post(
                        &tx,
                        GridUpdate::Failed {
                            grid,
                            message: err.to_string(),
                        },
                    );
                }
            }
        })
    }
}

fn set_state(states: &GridStates, grid: &str, state: GridState) {
    states
        .lock()
        .expect("grid state lock poisoned")
        .insert(grid.to_owned(), state);
}

/// The UI side may already be gone during shutdown; a worker never fails
/// for lack of a listener.
fn post(tx: &UnboundedSender<GridUpdate>, update: GridUpdate) {
    let _ = tx.send(update);
}
