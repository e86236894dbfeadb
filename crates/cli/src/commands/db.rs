use smc_core::{AppConfig, CoreError};
use smc_orm::connection::{close_quietly, connect, ping, server_version};

use super::{database_target, orm_error};

/// Verify the configured database is reachable with a single connection
pub async fn check(config: &AppConfig) -> Result<(), CoreError> {
    let target = database_target(config)?;
    println!("🔌 Connecting to {}", target);

    let mut conn = connect(&target).await.map_err(orm_error)?;

    let outcome = async {
        ping(&mut conn).await?;
        server_version(&mut conn).await
    }
    .await;
    close_quietly(conn).await;

    let version = outcome.map_err(orm_error)?;
    println!("✅ Connected: PostgreSQL {}", version);
    Ok(())
}
