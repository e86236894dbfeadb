//! `social_media_connections` rows: a user's link to an external platform account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smc_core::Platform;
use sqlx::{FromRow, PgConnection};
use tracing::debug;

use crate::error::{OrmError, OrmResult};
use crate::migrations::exclusivity::{CONNECTIONS_TABLE, LEGACY_CONSTRAINT};
use crate::migrations::schema_builder::SchemaBuilder;

const MAX_ID_LEN: usize = 255;

const RETURNING_COLUMNS: &str =
    "id, user_id, platform, platform_user_id, display_name, is_active, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SocialMediaConnection {
    pub id: i64,
    /// Internal user owning the link
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    /// Account identifier assigned by the platform
    pub platform_user_id: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConnection {
    pub user_id: String,
    pub platform: Platform,
    pub platform_user_id: String,
    pub display_name: Option<String>,
    pub is_active: bool,
}

impl NewConnection {
    /// An active link with no display name
    pub fn active(user_id: impl Into<String>, platform: Platform, platform_user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            platform,
            platform_user_id: platform_user_id.into(),
            display_name: None,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn validate(&self) -> OrmResult<()> {
        for (field, value) in [
            ("user_id", &self.user_id),
            ("platform_user_id", &self.platform_user_id),
        ] {
            if value.trim().is_empty() {
                return Err(OrmError::Validation(format!("{} cannot be empty", field)));
            }
            if value.len() > MAX_ID_LEN {
                return Err(OrmError::Validation(format!(
                    "{} is longer than {} characters",
                    field, MAX_ID_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Persistence for connection rows. Every call takes the caller's connection
/// (or transaction), so callers decide the transactional scope.
pub struct ConnectionRepository;

impl ConnectionRepository {
    /// DDL for the table as it exists before the exclusivity migration,
    /// including the table-wide `unique_platform_account` constraint.
    pub fn create_table_sql() -> String {
        let mut builder = SchemaBuilder::new();
        builder.create_table(CONNECTIONS_TABLE, |table| {
            table.id("id");
            table.string("user_id", Some(255), false);
            table.string("platform", Some(32), false);
            table.string("platform_user_id", Some(255), false);
            table.string("display_name", Some(255), true);
            table.boolean("is_active", true);
            table.timestamps();
            table.unique(LEGACY_CONSTRAINT, &["platform", "platform_user_id"]);
        });
        builder.build()
    }

    /// Insert a row. Exclusivity conflicts surface as [`OrmError::UniqueViolation`].
    pub async fn insert(conn: &mut PgConnection, new: &NewConnection) -> OrmResult<SocialMediaConnection> {
        new.validate()?;

        let sql = format!(
            "INSERT INTO {} (user_id, platform, platform_user_id, display_name, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CONNECTIONS_TABLE, RETURNING_COLUMNS
        );

        let row = sqlx::query_as::<_, SocialMediaConnection>(&sql)
            .bind(&new.user_id)
            .bind(new.platform.as_str())
            .bind(&new.platform_user_id)
            .bind(&new.display_name)
            .bind(new.is_active)
            .fetch_one(&mut *conn)
            .await?;

        debug!(
            "Inserted connection {} ({} / {})",
            row.id, row.platform, row.platform_user_id
        );
        Ok(row)
    }

    /// Mark a row inactive. Returns false if it was already inactive or absent.
    pub async fn deactivate(conn: &mut PgConnection, id: i64) -> OrmResult<bool> {
        let sql = format!(
            "UPDATE {} SET is_active = false, updated_at = now() WHERE id = $1 AND is_active",
            CONNECTIONS_TABLE
        );
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// The active link for a platform account, if any
    pub async fn find_active(
        conn: &mut PgConnection,
        platform: Platform,
        platform_user_id: &str,
    ) -> OrmResult<Option<SocialMediaConnection>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE platform = $1 AND platform_user_id = $2 AND is_active \
             ORDER BY id LIMIT 1",
            RETURNING_COLUMNS, CONNECTIONS_TABLE
        );
        let row = sqlx::query_as::<_, SocialMediaConnection>(&sql)
            .bind(platform.as_str())
            .bind(platform_user_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Every row, active or not, for a platform account, oldest first
    pub async fn history(
        conn: &mut PgConnection,
        platform: Platform,
        platform_user_id: &str,
    ) -> OrmResult<Vec<SocialMediaConnection>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE platform = $1 AND platform_user_id = $2 ORDER BY id",
            RETURNING_COLUMNS, CONNECTIONS_TABLE
        );
        let rows = sqlx::query_as::<_, SocialMediaConnection>(&sql)
            .bind(platform.as_str())
            .bind(platform_user_id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }
}
