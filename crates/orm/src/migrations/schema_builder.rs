//! Schema Builder - DSL for the DDL statements used by migrations
//!
//! Identifiers are always double-quoted and literals single-quoted; callers
//! are expected to have validated names already (see [`crate::security`]).

use super::definitions::{IndexCondition, PartialUniqueIndex};
use crate::security::{escape_identifier, quote_literal};

/// Accumulates DDL statements
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Create a new table
    pub fn create_table<F>(&mut self, table_name: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        let mut table_builder = TableBuilder::new(table_name);
        callback(&mut table_builder);

        self.statements.push(table_builder.to_sql());
        self
    }

    /// Drop a table constraint
    pub fn drop_constraint(&mut self, table_name: &str, constraint_name: &str) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            escape_identifier(table_name),
            escape_identifier(constraint_name)
        ));
        self
    }

    /// Drop an index
    pub fn drop_index(&mut self, index_name: &str) -> &mut Self {
        self.statements
            .push(format!("DROP INDEX {};", escape_identifier(index_name)));
        self
    }

    /// Create a unique index over the rows matching every condition
    pub fn create_partial_unique_index(&mut self, index: &PartialUniqueIndex) -> &mut Self {
        let columns: Vec<String> = index.columns.iter().map(|c| escape_identifier(c)).collect();
        let mut sql = format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            escape_identifier(&index.name),
            escape_identifier(&index.table),
            columns.join(", ")
        );
        if !index.conditions.is_empty() {
            let predicate: Vec<String> = index.conditions.iter().map(condition_sql).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.join(" AND "));
        }
        sql.push(';');
        self.statements.push(sql);
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements joined into one SQL string
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn condition_sql(condition: &IndexCondition) -> String {
    match condition {
        IndexCondition::Equals { column, value } => {
            format!("{} = {}", escape_identifier(column), quote_literal(value))
        }
        IndexCondition::IsTrue { column } => format!("{} = true", escape_identifier(column)),
    }
}

/// Table builder for CREATE TABLE statements
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
}

impl TableBuilder {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a column with a raw type definition
    pub fn column(&mut self, name: &str, definition: &str) -> &mut Self {
        self.columns
            .push(format!("{} {}", escape_identifier(name), definition));
        self
    }

    /// Add a BIGSERIAL primary key column
    pub fn id(&mut self, name: &str) -> &mut Self {
        self.column(name, "BIGSERIAL PRIMARY KEY")
    }

    /// Add a string column; `None` length means TEXT
    pub fn string(&mut self, name: &str, length: Option<u32>, nullable: bool) -> &mut Self {
        let mut definition = match length {
            Some(len) => format!("VARCHAR({})", len),
            None => "TEXT".to_string(),
        };
        if !nullable {
            definition.push_str(" NOT NULL");
        }
        self.column(name, &definition)
    }

    /// Add a NOT NULL boolean column with a default
    pub fn boolean(&mut self, name: &str, default: bool) -> &mut Self {
        self.column(name, &format!("BOOLEAN NOT NULL DEFAULT {}", default))
    }

    /// Add created_at / updated_at columns
    pub fn timestamps(&mut self) -> &mut Self {
        self.column("created_at", "TIMESTAMPTZ NOT NULL DEFAULT now()");
        self.column("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT now()")
    }

    /// Add a named unique constraint
    pub fn unique(&mut self, name: &str, columns: &[&str]) -> &mut Self {
        let columns: Vec<String> = columns.iter().map(|c| escape_identifier(c)).collect();
        self.constraints.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            escape_identifier(name),
            columns.join(", ")
        ));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.clone());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            escape_identifier(&self.table_name),
            parts.join(",\n    ")
        )
    }
}
