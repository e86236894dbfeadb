//! Read-only report of where a schema stands relative to the exclusivity migration.

use serde::Serialize;
use smc_core::Platform;

use super::exclusivity::ExclusivityConfig;
use super::executor::SchemaExecutor;
use crate::connection::{close_quietly, connect, ConnectionString};
use crate::error::OrmResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub platform: Platform,
    pub name: String,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub table: String,
    pub legacy_constraint: String,
    pub legacy_constraint_present: bool,
    pub indexes: Vec<IndexStatus>,
}

impl SchemaStatus {
    /// Legacy constraint gone and every exclusivity index present
    pub fn is_migrated(&self) -> bool {
        !self.legacy_constraint_present && self.indexes.iter().all(|i| i.present)
    }

    pub fn missing_indexes(&self) -> Vec<&str> {
        self.indexes
            .iter()
            .filter(|i| !i.present)
            .map(|i| i.name.as_str())
            .collect()
    }
}

/// Inspect the catalog through any executor (a connection or a transaction)
pub async fn inspect_status<E>(executor: &mut E, config: &ExclusivityConfig) -> OrmResult<SchemaStatus>
where
    E: SchemaExecutor + ?Sized,
{
    config.validate()?;

    let legacy_constraint_present = executor
        .constraint_exists(&config.table, &config.legacy_constraint)
        .await?;

    let mut indexes = Vec::with_capacity(config.platforms.len());
    for (platform, name) in config.index_names() {
        let present = executor.index_exists(&name).await?;
        indexes.push(IndexStatus {
            platform,
            name,
            present,
        });
    }

    Ok(SchemaStatus {
        table: config.table.clone(),
        legacy_constraint: config.legacy_constraint.clone(),
        legacy_constraint_present,
        indexes,
    })
}

/// Connect, inspect, and close
pub async fn inspect(target: &ConnectionString, config: &ExclusivityConfig) -> OrmResult<SchemaStatus> {
    let mut conn = connect(target).await?;
    let result = inspect_status(&mut conn, config).await;
    close_quietly(conn).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::executor::fake::FakeCatalog;
    use crate::migrations::exclusivity::{CONNECTIONS_TABLE, LEGACY_CONSTRAINT};

    #[tokio::test]
    async fn test_unmigrated_schema() {
        let mut catalog = FakeCatalog::default().with_constraint(CONNECTIONS_TABLE, LEGACY_CONSTRAINT);
        let status = inspect_status(&mut catalog, &ExclusivityConfig::default())
            .await
            .unwrap();

        assert!(status.legacy_constraint_present);
        assert!(!status.is_migrated());
        assert_eq!(
            status.missing_indexes(),
            vec!["ux_smc_fb_active", "ux_smc_ig_active"]
        );
    }

    #[tokio::test]
    async fn test_migrated_schema() {
        let mut catalog = FakeCatalog::default()
            .with_index("ux_smc_fb_active")
            .with_index("ux_smc_ig_active");
        let status = inspect_status(&mut catalog, &ExclusivityConfig::default())
            .await
            .unwrap();

        assert!(status.is_migrated());
        assert!(status.missing_indexes().is_empty());
        assert!(catalog.executed.is_empty());
    }

    #[tokio::test]
    async fn test_partially_migrated_schema() {
        let mut catalog = FakeCatalog::default().with_index("ux_smc_fb_active");
        let config = ExclusivityConfig::default();
        let status = inspect_status(&mut catalog, &config).await.unwrap();

        assert!(!status.is_migrated());
        assert_eq!(status.indexes[0].platform, Platform::Facebook);
        assert!(status.indexes[0].present);
        assert!(!status.indexes[1].present);
    }
}
