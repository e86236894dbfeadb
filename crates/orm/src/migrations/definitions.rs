//! Migration Definitions - Core types for idempotent schema migrations
//!
//! A [`MigrationPlan`] is an ordered list of [`MigrationStep`]s. Every step
//! carries its own existence check, so replaying a plan against an already
//! migrated schema changes nothing.

use serde::Serialize;
use std::fmt;

use super::schema_builder::SchemaBuilder;

/// One predicate term of a partial index `WHERE` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexCondition {
    /// `column = 'value'`
    Equals { column: String, value: String },
    /// `column = true`
    IsTrue { column: String },
}

/// A unique index restricted to rows matching every condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialUniqueIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub conditions: Vec<IndexCondition>,
}

/// An ordered, idempotent unit of schema change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum MigrationStep {
    /// Drop a table constraint if the catalog shows it exists
    DropConstraintIfExists { table: String, constraint: String },
    /// Drop an index if the catalog shows it exists
    DropIndexIfExists { index: String },
    /// Create a partial unique index unless one with that name exists
    CreatePartialUniqueIndex(PartialUniqueIndex),
}

impl MigrationStep {
    /// The DDL executed when the step's existence check calls for a change
    pub fn sql(&self) -> String {
        let mut builder = SchemaBuilder::new();
        match self {
            MigrationStep::DropConstraintIfExists { table, constraint } => {
                builder.drop_constraint(table, constraint);
            }
            MigrationStep::DropIndexIfExists { index } => {
                builder.drop_index(index);
            }
            MigrationStep::CreatePartialUniqueIndex(index) => {
                builder.create_partial_unique_index(index);
            }
        }
        builder.build()
    }

    /// Name of the catalog object this step manages
    pub fn target(&self) -> &str {
        match self {
            MigrationStep::DropConstraintIfExists { constraint, .. } => constraint,
            MigrationStep::DropIndexIfExists { index } => index,
            MigrationStep::CreatePartialUniqueIndex(index) => &index.name,
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStep::DropConstraintIfExists { table, constraint } => {
                write!(f, "drop constraint {} on {} if present", constraint, table)
            }
            MigrationStep::DropIndexIfExists { index } => {
                write!(f, "drop index {} if present", index)
            }
            MigrationStep::CreatePartialUniqueIndex(index) => {
                write!(
                    f,
                    "create partial unique index {} on {} ({})",
                    index.name,
                    index.table,
                    index.columns.join(", ")
                )
            }
        }
    }
}

/// A named, ordered sequence of steps applied in one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub name: String,
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Full SQL of every step, for dry runs. Existence checks are not shown.
    pub fn preview_sql(&self) -> Vec<String> {
        self.steps.iter().map(MigrationStep::sql).collect()
    }
}

/// What a step did when it ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// DDL was executed
    Applied,
    /// Schema already in the desired state; nothing executed
    Skipped,
}

/// Per-step record of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub description: String,
    pub target: String,
    pub outcome: StepOutcome,
}

/// Result of a committed migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationRunResult {
    pub migration: String,
    pub steps: Vec<StepReport>,
    /// Steps that executed DDL
    pub applied_count: usize,
    /// Steps whose target was already in the desired state
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    pub fn from_reports(migration: &str, steps: Vec<StepReport>, execution_time_ms: u128) -> Self {
        let applied_count = steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .count();
        Self {
            migration: migration.to_string(),
            skipped_count: steps.len() - applied_count,
            applied_count,
            steps,
            execution_time_ms,
        }
    }
}
