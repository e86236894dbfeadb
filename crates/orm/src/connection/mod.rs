//! Connection establishment
//!
//! The tooling holds exactly one connection per run: no pool, no retries.

pub mod string;

pub use string::{ConnectionString, ConnectionStringError, Scheme, DEFAULT_PORT};

use sqlx::{Connection, PgConnection};
use tracing::{debug, warn};

use crate::error::{OrmError, OrmResult};

/// Open a single connection to the target
pub async fn connect(target: &ConnectionString) -> OrmResult<PgConnection> {
    debug!("Connecting to {}", target.masked());

    PgConnection::connect_with(&target.connect_options())
        .await
        .map_err(|e| {
            OrmError::Connection(format!("Failed to connect to {}: {}", target.masked(), e))
        })
}

/// Close a connection, logging but otherwise ignoring failures.
///
/// Used on every exit path, including after an earlier error, so a close
/// failure must never replace the error the caller is about to report.
pub async fn close_quietly(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close database connection cleanly: {}", e);
    }
}

/// Round-trip a trivial query to prove the connection is usable
pub async fn ping(conn: &mut PgConnection) -> OrmResult<()> {
    conn.ping()
        .await
        .map_err(|e| OrmError::Connection(format!("Ping failed: {}", e)))
}

/// Server version string as reported by `SHOW server_version`
pub async fn server_version(conn: &mut PgConnection) -> OrmResult<String> {
    let version: String = sqlx::query_scalar("SHOW server_version")
        .fetch_one(&mut *conn)
        .await?;
    Ok(version)
}
