use smc_core::{AppConfig, CoreError};
use smc_orm::{
    inspect, ExclusivityConfig, MigrationPlan, MigrationRunResult, MigrationRunner, OrmError,
    SchemaStatus, StepOutcome,
};

use super::{database_target, orm_error};

fn exclusivity_config(config: &AppConfig) -> ExclusivityConfig {
    ExclusivityConfig::default().with_platforms(config.exclusive_platforms.clone())
}

/// Only failures after the transaction opened leave something to roll back
fn rolled_back(err: &OrmError) -> bool {
    matches!(err, OrmError::Migration(_) | OrmError::Transaction(_))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub async fn exclusivity(config: &AppConfig, dry_run: bool, json: bool) -> Result<(), CoreError> {
    let plan = exclusivity_config(config)
        .plan()
        .map_err(orm_error)?;

    if dry_run {
        print_plan(&plan, json)?;
        return Ok(());
    }

    let target = database_target(config)?;
    if !json {
        println!("🔧 Applying {} to {}", plan.name, target);
    }

    let result = MigrationRunner::new(plan).run(&target).await.map_err(|e| {
        if !json && rolled_back(&e) {
            println!("❌ Migration rolled back, schema unchanged");
        }
        orm_error(e)
    })?;

    if json {
        println!("{}", to_json(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

pub async fn status(config: &AppConfig, json: bool) -> Result<(), CoreError> {
    let exclusivity = exclusivity_config(config);
    let target = database_target(config)?;

    let status = inspect(&target, &exclusivity).await.map_err(orm_error)?;

    if json {
        println!("{}", to_json(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn print_plan(plan: &MigrationPlan, json: bool) -> Result<(), CoreError> {
    if json {
        println!("{}", to_json(plan)?);
        return Ok(());
    }

    println!("-- {} (dry run, {} steps)", plan.name, plan.steps.len());
    println!("BEGIN;");
    for (step, sql) in plan.steps.iter().zip(plan.preview_sql()) {
        println!("-- {}", step);
        println!("{}", sql);
    }
    println!("COMMIT;");
    Ok(())
}

fn print_result(result: &MigrationRunResult) {
    for step in &result.steps {
        let marker = match step.outcome {
            StepOutcome::Applied => "✅",
            StepOutcome::Skipped => "⏭️ ",
        };
        println!("  {} {}", marker, step.description);
    }
    println!(
        "✅ {} complete: {} applied, {} skipped ({}ms)",
        result.migration, result.applied_count, result.skipped_count, result.execution_time_ms
    );
}

fn print_status(status: &SchemaStatus) {
    println!("Table: {}", status.table);
    println!(
        "  {} legacy constraint {}",
        if status.legacy_constraint_present { "⚠️ " } else { "✅" },
        status.legacy_constraint
    );
    for index in &status.indexes {
        println!(
            "  {} {} ({})",
            if index.present { "✅" } else { "❌" },
            index.name,
            index.platform
        );
    }

    if status.is_migrated() {
        println!("Exclusivity migration applied");
    } else {
        println!("Exclusivity migration pending: run `smc migrate exclusivity`");
    }
}
