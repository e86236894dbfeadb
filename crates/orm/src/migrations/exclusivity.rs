//! Connection exclusivity migration.
//!
//! Replaces the table-wide `unique_platform_account` constraint with one
//! partial unique index per exclusive platform, so a platform account can be
//! linked to at most one *active* row on that platform while inactive history
//! rows and non-exclusive platforms are unconstrained.

use std::collections::HashSet;

use smc_core::{Platform, DEFAULT_EXCLUSIVE_PLATFORMS};

use super::definitions::{IndexCondition, MigrationPlan, MigrationStep, PartialUniqueIndex};
use crate::error::{OrmError, OrmResult};
use crate::security::validate_identifier;

pub const MIGRATION_NAME: &str = "connection_exclusivity";
pub const CONNECTIONS_TABLE: &str = "social_media_connections";
pub const LEGACY_CONSTRAINT: &str = "unique_platform_account";

/// Name of the exclusivity index for a platform, e.g. `ux_smc_fb_active`
pub fn index_name(platform: Platform) -> String {
    format!("ux_smc_{}_active", platform.short_code())
}

/// Tables, columns and platforms the exclusivity migration operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusivityConfig {
    pub table: String,
    pub legacy_constraint: String,
    pub platform_column: String,
    pub account_column: String,
    pub active_column: String,
    pub platforms: Vec<Platform>,
}

impl Default for ExclusivityConfig {
    fn default() -> Self {
        Self {
            table: CONNECTIONS_TABLE.to_string(),
            legacy_constraint: LEGACY_CONSTRAINT.to_string(),
            platform_column: "platform".to_string(),
            account_column: "platform_user_id".to_string(),
            active_column: "is_active".to_string(),
            platforms: DEFAULT_EXCLUSIVE_PLATFORMS.to_vec(),
        }
    }
}

impl ExclusivityConfig {
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    /// `(platform, index name)` for every configured platform, in order
    pub fn index_names(&self) -> Vec<(Platform, String)> {
        self.platforms.iter().map(|p| (*p, index_name(*p))).collect()
    }

    pub fn validate(&self) -> OrmResult<()> {
        for identifier in [
            &self.table,
            &self.legacy_constraint,
            &self.platform_column,
            &self.account_column,
            &self.active_column,
        ] {
            validate_identifier(identifier)?;
        }

        if self.platforms.is_empty() {
            return Err(OrmError::Configuration(
                "exclusivity migration needs at least one platform".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for platform in &self.platforms {
            if !seen.insert(platform) {
                return Err(OrmError::Configuration(format!(
                    "platform '{}' is listed more than once",
                    platform
                )));
            }
        }

        Ok(())
    }

    fn index_for(&self, platform: Platform) -> PartialUniqueIndex {
        PartialUniqueIndex {
            name: index_name(platform),
            table: self.table.clone(),
            columns: vec![self.account_column.clone()],
            conditions: vec![
                IndexCondition::Equals {
                    column: self.platform_column.clone(),
                    value: platform.as_str().to_string(),
                },
                IndexCondition::IsTrue {
                    column: self.active_column.clone(),
                },
            ],
        }
    }

    /// Build the ordered step list.
    ///
    /// Existing exclusivity indexes are dropped and recreated rather than
    /// kept, so an index left behind with a stale predicate gets replaced.
    pub fn plan(&self) -> OrmResult<MigrationPlan> {
        self.validate()?;

        let mut steps = vec![MigrationStep::DropConstraintIfExists {
            table: self.table.clone(),
            constraint: self.legacy_constraint.clone(),
        }];

        steps.extend(
            self.platforms
                .iter()
                .map(|p| MigrationStep::DropIndexIfExists { index: index_name(*p) }),
        );

        steps.extend(
            self.platforms
                .iter()
                .map(|p| MigrationStep::CreatePartialUniqueIndex(self.index_for(*p))),
        );

        Ok(MigrationPlan {
            name: MIGRATION_NAME.to_string(),
            steps,
        })
    }
}
