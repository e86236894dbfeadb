//! Exclusivity migration against a real PostgreSQL server.
//!
//! Ignored by default. Run with
//! `TEST_DATABASE_URL=postgres://user:pw@localhost/smc_test cargo test -p smc-orm -- --ignored`.
//! Each test works in its own throwaway schema selected through `search_path`.

use smc_core::Platform;
use smc_orm::{
    connect, ConnectionRepository, ConnectionString, ExclusivityConfig, MigrationRunner,
    NewConnection, OrmError, SchemaBuilder, SchemaExecutor, StepOutcome, CONNECTIONS_TABLE,
    LEGACY_CONSTRAINT,
};
use sqlx::PgConnection;

struct TestSchema {
    conn: PgConnection,
    name: String,
}

impl TestSchema {
    async fn create() -> Self {
        Self::create_with(&ConnectionRepository::create_table_sql()).await
    }

    async fn create_with(table_sql: &str) -> Self {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let target = ConnectionString::parse(&url).expect("TEST_DATABASE_URL must be valid");
        let mut conn = connect(&target).await.expect("test database reachable");

        let name = format!("smc_test_{}", uuid::Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE SCHEMA {}", name))
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query(&format!("SET search_path TO {}", name))
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query(table_sql)
            .execute(&mut conn)
            .await
            .unwrap();

        Self { conn, name }
    }

    async fn index_names(&mut self) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT indexname::text FROM pg_indexes \
             WHERE schemaname = current_schema() AND tablename = 'social_media_connections' \
             ORDER BY indexname",
        )
        .fetch_all(&mut self.conn)
        .await
        .unwrap()
    }

    /// Index definitions plus constraint names, enough to compare schema states
    async fn snapshot(&mut self) -> (Vec<(String, String)>, Vec<String>) {
        let indexes: Vec<(String, String)> = sqlx::query_as(
            "SELECT indexname::text, indexdef FROM pg_indexes \
             WHERE schemaname = current_schema() ORDER BY indexname",
        )
        .fetch_all(&mut self.conn)
        .await
        .unwrap();
        let constraints: Vec<String> = sqlx::query_scalar(
            "SELECT c.conname::text FROM pg_constraint c \
             JOIN pg_namespace n ON n.oid = c.connamespace \
             WHERE n.nspname = current_schema() ORDER BY c.conname",
        )
        .fetch_all(&mut self.conn)
        .await
        .unwrap();
        (indexes, constraints)
    }

    async fn migrate(&mut self) -> Result<smc_orm::MigrationRunResult, OrmError> {
        let plan = ExclusivityConfig::default().plan().unwrap();
        MigrationRunner::new(plan).run_on(&mut self.conn).await
    }

    async fn cleanup(mut self) {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.name))
            .execute(&mut self.conn)
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore] // Requires TEST_DATABASE_URL
async fn migration_replaces_legacy_constraint_with_two_partial_indexes() {
    let mut schema = TestSchema::create().await;
    assert!(schema
        .conn
        .constraint_exists("social_media_connections", "unique_platform_account")
        .await
        .unwrap());

    let result = schema.migrate().await.unwrap();
    assert_eq!(result.applied_count, 3);

    assert!(!schema
        .conn
        .constraint_exists("social_media_connections", "unique_platform_account")
        .await
        .unwrap());
    assert_eq!(
        schema.index_names().await,
        vec![
            "social_media_connections_pkey".to_string(),
            "ux_smc_fb_active".to_string(),
            "ux_smc_ig_active".to_string(),
        ]
    );

    schema.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires TEST_DATABASE_URL
async fn second_run_succeeds_and_leaves_identical_schema() {
    let mut schema = TestSchema::create().await;

    schema.migrate().await.unwrap();
    let after_first = schema.snapshot().await;

    let second = schema.migrate().await.unwrap();
    let after_second = schema.snapshot().await;

    assert_eq!(after_first, after_second);
    assert_eq!(second.steps[0].outcome, StepOutcome::Skipped);

    schema.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires TEST_DATABASE_URL
async fn duplicate_active_rows_conflict_only_on_exclusive_platforms() {
    let mut schema = TestSchema::create().await;
    schema.migrate().await.unwrap();

    ConnectionRepository::insert(
        &mut schema.conn,
        &NewConnection::active("user-a", Platform::Facebook, "fb-100"),
    )
    .await
    .unwrap();
    let err = ConnectionRepository::insert(
        &mut schema.conn,
        &NewConnection::active("user-b", Platform::Facebook, "fb-100"),
    )
    .await
    .unwrap_err();
    assert!(err.is_unique_violation_on("ux_smc_fb_active"), "got {:?}", err);

    for user in ["user-a", "user-b"] {
        ConnectionRepository::insert(
            &mut schema.conn,
            &NewConnection::active(user, Platform::TikTok, "tt-100"),
        )
        .await
        .unwrap();
    }
    let tiktok_rows = ConnectionRepository::history(&mut schema.conn, Platform::TikTok, "tt-100")
        .await
        .unwrap();
    assert_eq!(tiktok_rows.len(), 2);

    schema.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires TEST_DATABASE_URL
async fn inactive_rows_are_outside_the_index_predicate() {
    let mut schema = TestSchema::create().await;
    schema.migrate().await.unwrap();

    let old = ConnectionRepository::insert(
        &mut schema.conn,
        &NewConnection::active("user-a", Platform::Instagram, "ig-7").inactive(),
    )
    .await
    .unwrap();
    let current = ConnectionRepository::insert(
        &mut schema.conn,
        &NewConnection::active("user-b", Platform::Instagram, "ig-7"),
    )
    .await
    .unwrap();

    let active = ConnectionRepository::find_active(&mut schema.conn, Platform::Instagram, "ig-7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, current.id);
    assert_ne!(active.id, old.id);

    // Relinking after deactivation is allowed
    assert!(ConnectionRepository::deactivate(&mut schema.conn, current.id)
        .await
        .unwrap());
    ConnectionRepository::insert(
        &mut schema.conn,
        &NewConnection::active("user-c", Platform::Instagram, "ig-7"),
    )
    .await
    .unwrap();

    schema.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires TEST_DATABASE_URL
async fn failed_index_creation_restores_legacy_constraint() {
    let mut schema = TestSchema::create().await;

    // A table occupying an index name makes the final CREATE INDEX fail
    sqlx::query("CREATE TABLE ux_smc_ig_active (id INTEGER)")
        .execute(&mut schema.conn)
        .await
        .unwrap();
    let before = schema.snapshot().await;

    let err = schema.migrate().await.unwrap_err();
    assert!(matches!(err, OrmError::Migration(_)), "got {:?}", err);

    assert!(schema
        .conn
        .constraint_exists("social_media_connections", "unique_platform_account")
        .await
        .unwrap());
    assert!(!schema.conn.index_exists("ux_smc_fb_active").await.unwrap());
    assert_eq!(schema.snapshot().await, before);

    schema.cleanup().await;
}

/// A legacy table whose constraint is scoped per user, so two users can both
/// hold the same active account before the migration runs.
fn per_user_table_sql() -> String {
    let mut builder = SchemaBuilder::new();
    builder.create_table(CONNECTIONS_TABLE, |table| {
        table.id("id");
        table.string("user_id", Some(255), false);
        table.string("platform", Some(32), false);
        table.string("platform_user_id", Some(255), false);
        table.string("display_name", Some(255), true);
        table.boolean("is_active", true);
        table.timestamps();
        table.unique(LEGACY_CONSTRAINT, &["user_id", "platform", "platform_user_id"]);
    });
    builder.build()
}

#[tokio::test]
#[ignore] // Requires TEST_DATABASE_URL
async fn conflicting_active_rows_roll_back_the_whole_migration() {
    let mut schema = TestSchema::create_with(&per_user_table_sql()).await;

    for user in ["user-a", "user-b"] {
        ConnectionRepository::insert(
            &mut schema.conn,
            &NewConnection::active(user, Platform::Facebook, "fb-shared"),
        )
        .await
        .unwrap();
    }
    let before = schema.snapshot().await;

    let err = schema.migrate().await.unwrap_err();
    match &err {
        OrmError::Migration(message) => {
            assert!(message.contains("ux_smc_fb_active"), "got {}", message)
        }
        other => panic!("expected a migration error, got {:?}", other),
    }

    assert!(schema
        .conn
        .constraint_exists(CONNECTIONS_TABLE, LEGACY_CONSTRAINT)
        .await
        .unwrap());
    assert!(!schema.conn.index_exists("ux_smc_ig_active").await.unwrap());
    assert_eq!(schema.snapshot().await, before);

    let rows = ConnectionRepository::history(&mut schema.conn, Platform::Facebook, "fb-shared")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    schema.cleanup().await;
}

#[tokio::test]
async fn unreachable_server_fails_before_any_ddl() {
    let target = ConnectionString::parse("postgres://smc@127.0.0.1:1/social").unwrap();
    let plan = ExclusivityConfig::default().plan().unwrap();

    let err = MigrationRunner::new(plan).run(&target).await.unwrap_err();
    assert!(matches!(err, OrmError::Connection(_)), "got {:?}", err);
}
