//! Migration Runner - Applies a plan inside a single transaction
//!
//! Every step is checked against the catalog before it executes. Any error
//! rolls the whole transaction back, so a run either commits all of its
//! changes or none of them.

use sqlx::{Connection, PgConnection};
use std::time::Instant;
use tracing::{error, info, warn};

use super::definitions::{MigrationPlan, MigrationRunResult, MigrationStep, StepOutcome, StepReport};
use super::executor::SchemaExecutor;
use crate::connection::{close_quietly, connect, ConnectionString};
use crate::error::{OrmError, OrmResult};

/// Migration runner that executes one plan against a database
pub struct MigrationRunner {
    plan: MigrationPlan,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new(plan: MigrationPlan) -> Self {
        Self { plan }
    }

    /// Connect, apply the plan, and close the connection whatever the outcome
    pub async fn run(&self, target: &ConnectionString) -> OrmResult<MigrationRunResult> {
        let mut conn = connect(target).await?;
        let result = self.run_on(&mut conn).await;
        close_quietly(conn).await;
        result
    }

    /// Apply the plan on an already open connection, in one transaction
    pub async fn run_on(&self, conn: &mut PgConnection) -> OrmResult<MigrationRunResult> {
        let start_time = Instant::now();
        info!("Applying migration: {}", self.plan.name);

        let mut transaction = conn
            .begin()
            .await
            .map_err(|e| OrmError::Transaction(format!("Failed to start transaction: {}", e)))?;

        match apply_steps(&mut *transaction, &self.plan).await {
            Ok(reports) => {
                transaction.commit().await.map_err(|e| {
                    OrmError::Transaction(format!("Failed to commit migration: {}", e))
                })?;

                let result = MigrationRunResult::from_reports(
                    &self.plan.name,
                    reports,
                    start_time.elapsed().as_millis(),
                );
                info!(
                    "Migration {} committed ({} applied, {} skipped)",
                    result.migration, result.applied_count, result.skipped_count
                );
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    warn!("Explicit rollback failed, relying on connection reset: {}", rollback_err);
                }
                error!("Migration {} rolled back: {}", self.plan.name, e);
                Err(e)
            }
        }
    }
}

/// Run each step's existence check and, where needed, its DDL, in order.
///
/// Stops at the first failing step; the caller owns the transaction.
pub async fn apply_steps<E>(executor: &mut E, plan: &MigrationPlan) -> OrmResult<Vec<StepReport>>
where
    E: SchemaExecutor + ?Sized,
{
    let mut reports = Vec::with_capacity(plan.steps.len());

    for (position, step) in plan.steps.iter().enumerate() {
        let outcome = apply_step(executor, step).await.map_err(|e| {
            OrmError::Migration(format!(
                "step {} of {} ({}) failed: {}",
                position + 1,
                plan.steps.len(),
                step,
                e
            ))
        })?;

        match outcome {
            StepOutcome::Applied => info!("  applied: {}", step),
            StepOutcome::Skipped => info!("  skipped: {} (already in place)", step),
        }

        reports.push(StepReport {
            description: step.to_string(),
            target: step.target().to_string(),
            outcome,
        });
    }

    Ok(reports)
}

async fn apply_step<E>(executor: &mut E, step: &MigrationStep) -> OrmResult<StepOutcome>
where
    E: SchemaExecutor + ?Sized,
{
    let needed = match step {
        MigrationStep::DropConstraintIfExists { table, constraint } => {
            executor.constraint_exists(table, constraint).await?
        }
        MigrationStep::DropIndexIfExists { index } => executor.index_exists(index).await?,
        MigrationStep::CreatePartialUniqueIndex(index) => {
            !executor.index_exists(&index.name).await?
        }
    };

    if !needed {
        return Ok(StepOutcome::Skipped);
    }

    executor.execute(&step.sql()).await?;
    Ok(StepOutcome::Applied)
}
