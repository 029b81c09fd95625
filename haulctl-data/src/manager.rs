//! Database connection pool management.
//!
//! Uses sqlx MySqlPool with explicit connection limits. If the pool cannot
//! be created at startup the manager degrades to ad hoc connections opened
//! and closed per call, so an unreachable database never prevents the tool
//! from starting; individual operations fail instead.

use sqlx::mysql::{MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, MySql};
use tracing::{debug, warn};

use haulctl_core::{DataError, DbConfig};

/// Owns the pool (or the degraded no-pool mode) and lends out connections.
#[derive(Debug)]
pub struct ConnectionManager {
    config: DbConfig,
    pool: Option<MySqlPool>,
}

/// A connection on loan from the manager.
///
/// Release consumes the handle, so releasing twice is unrepresentable; a
/// pooled connection goes back to the idle set, a direct one is closed.
#[derive(Debug)]
pub enum DbConn {
    Pooled(PoolConnection<MySql>),
    Direct(MySqlConnection),
}

impl DbConn {
    /// The executable connection behind the handle.
    pub fn as_exec(&mut self) -> &mut MySqlConnection {
        match self {
            DbConn::Pooled(conn) => &mut *conn,
            DbConn::Direct(conn) => conn,
        }
    }

    /// Return the connection to its owner.
    ///
    /// Pooled handles return to the idle set on drop; direct connections
    /// get a graceful close so the server is not left with a dangling
    /// session.
    pub async fn release(self) {
        match self {
            DbConn::Pooled(conn) => drop(conn),
            DbConn::Direct(conn) => {
                if let Err(err) = conn.close().await {
                    debug!("direct connection close failed: {err}");
                }
            }
        }
    }
}

impl ConnectionManager {
    /// Create the manager, attempting to build the pool once.
    ///
    /// Pool-creation failure is logged and tolerated; the manager then
    /// serves direct connections per call until process exit.
    pub async fn connect(config: DbConfig) -> Self {
        let pool = match MySqlPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url())
            .await
        {
            Ok(pool) => {
                debug!(capacity = config.pool_size, "connection pool created");
                Some(pool)
            }
            Err(err) => {
                warn!("connection pool unavailable, falling back to direct connections: {err}");
                None
            }
        };

        Self { config, pool }
    }

    /// Build a manager around an existing pool. Test seam.
    pub fn from_pool(config: DbConfig, pool: MySqlPool) -> Self {
        Self {
            config,
            pool: Some(pool),
        }
    }

    /// True when the pool came up at startup.
    pub fn pooled(&self) -> bool {
        self.pool.is_some()
    }

    /// Borrow a connection, preferring the pool.
    ///
    /// A pool failure (exhaustion, dead connection, network) triggers one
    /// direct-connect attempt with the same credentials before the error
    /// surfaces to the caller.
    pub async fn acquire(&self) -> Result<DbConn, DataError> {
        if let Some(pool) = &self.pool {
            match pool.acquire().await {
                Ok(conn) => return Ok(DbConn::Pooled(conn)),
                Err(err) => {
                    warn!("pool acquire failed, trying direct connection: {err}");
                }
            }
        }

        match MySqlConnection::connect(&self.config.url()).await {
            Ok(conn) => Ok(DbConn::Direct(conn)),
            Err(err) => Err(DataError::connection(err.to_string())),
        }
    }

    /// Tear the pool down at process exit.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
