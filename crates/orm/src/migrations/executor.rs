//! Catalog introspection and DDL execution seam for migrations.

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::error::OrmResult;

/// Existence checks only see relations on the session `search_path`, the
/// same resolution the unqualified DDL statements use.
const CONSTRAINT_EXISTS_SQL: &str = "SELECT EXISTS (\
     SELECT 1 FROM pg_catalog.pg_constraint c \
     JOIN pg_catalog.pg_class t ON t.oid = c.conrelid \
     WHERE t.relname = $1 AND c.conname = $2 AND pg_catalog.pg_table_is_visible(t.oid))";

const INDEX_EXISTS_SQL: &str = "SELECT EXISTS (\
     SELECT 1 FROM pg_catalog.pg_class c \
     WHERE c.relkind IN ('i', 'I') AND c.relname = $1 AND pg_catalog.pg_table_is_visible(c.oid))";

/// What the migration runner needs from a database session
#[async_trait]
pub trait SchemaExecutor: Send {
    /// Whether `table` carries a constraint named `constraint`
    async fn constraint_exists(&mut self, table: &str, constraint: &str) -> OrmResult<bool>;

    /// Whether an index named `index` exists
    async fn index_exists(&mut self, index: &str) -> OrmResult<bool>;

    /// Execute one DDL statement
    async fn execute(&mut self, sql: &str) -> OrmResult<()>;
}

#[async_trait]
impl SchemaExecutor for PgConnection {
    async fn constraint_exists(&mut self, table: &str, constraint: &str) -> OrmResult<bool> {
        let exists: bool = sqlx::query_scalar(CONSTRAINT_EXISTS_SQL)
            .bind(table)
            .bind(constraint)
            .fetch_one(&mut *self)
            .await?;
        Ok(exists)
    }

    async fn index_exists(&mut self, index: &str) -> OrmResult<bool> {
        let exists: bool = sqlx::query_scalar(INDEX_EXISTS_SQL)
            .bind(index)
            .fetch_one(&mut *self)
            .await?;
        Ok(exists)
    }

    async fn execute(&mut self, sql: &str) -> OrmResult<()> {
        sqlx::query(sql).execute(&mut *self).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory catalog used to unit test step sequencing.

    use super::*;
    use crate::error::OrmError;
    use std::collections::BTreeSet;

    #[derive(Debug, Default)]
    pub struct FakeCatalog {
        pub constraints: BTreeSet<(String, String)>,
        pub indexes: BTreeSet<String>,
        pub executed: Vec<String>,
        /// Fail any statement containing this text
        pub fail_on: Option<String>,
    }

    impl FakeCatalog {
        pub fn with_constraint(mut self, table: &str, constraint: &str) -> Self {
            self.constraints
                .insert((table.to_string(), constraint.to_string()));
            self
        }

        pub fn with_index(mut self, index: &str) -> Self {
            self.indexes.insert(index.to_string());
            self
        }

        fn quoted_names(sql: &str) -> Vec<String> {
            sql.split('"')
                .enumerate()
                .filter(|(i, _)| i % 2 == 1)
                .map(|(_, s)| s.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl SchemaExecutor for FakeCatalog {
        async fn constraint_exists(&mut self, table: &str, constraint: &str) -> OrmResult<bool> {
            Ok(self
                .constraints
                .contains(&(table.to_string(), constraint.to_string())))
        }

        async fn index_exists(&mut self, index: &str) -> OrmResult<bool> {
            Ok(self.indexes.contains(index))
        }

        async fn execute(&mut self, sql: &str) -> OrmResult<()> {
            if let Some(needle) = &self.fail_on {
                if sql.contains(needle.as_str()) {
                    return Err(OrmError::Database(format!("forced failure: {}", sql)));
                }
            }

            let names = Self::quoted_names(sql);
            if sql.starts_with("ALTER TABLE") {
                self.constraints.remove(&(names[0].clone(), names[1].clone()));
            } else if sql.starts_with("DROP INDEX") {
                self.indexes.remove(&names[0]);
            } else if sql.starts_with("CREATE UNIQUE INDEX") {
                self.indexes.insert(names[0].clone());
            }
            self.executed.push(sql.to_string());
            Ok(())
        }
    }
}
