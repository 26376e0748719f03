//! SQLite profile repository implementation.
//!
//! Implements `ProfileRepository` from `fusion-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, rfc3339 datetimes.
//!
//! `try_increment` is a single conditional UPDATE so the limit check and
//! the increment cannot be split by a concurrent writer.

use fusion_core::profile::ProfileRepository;
use fusion_types::error::RepositoryError;
use fusion_types::profile::{Profile, Tier, UserId};
use fusion_types::quota::{IncrementOutcome, UsageCounter};

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ProfileRepository`.
pub struct SqliteProfileRepository {
    pool: DatabasePool,
}

impl SqliteProfileRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ProfileRow {
    id: String,
    tier: String,
    daily_message_count: i64,
    image_generation_count: i64,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tier: row.try_get("tier")?,
            daily_message_count: row.try_get("daily_message_count")?,
            image_generation_count: row.try_get("image_generation_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<Profile, RepositoryError> {
        let user_id: UserId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))?;
        let tier: Tier = self
            .tier
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;
        let updated_at = parse_datetime(&self.updated_at)?;

        Ok(Profile {
            user_id,
            tier,
            daily_message_count: self.daily_message_count as u32,
            image_generation_count: self.image_generation_count as u32,
            created_at,
            updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// The column a usage counter is stored in. Static strings only -- these
/// are interpolated into SQL.
fn counter_column(counter: UsageCounter) -> &'static str {
    match counter {
        UsageCounter::DailyMessages => "daily_message_count",
        UsageCounter::ImageGenerations => "image_generation_count",
    }
}

// ---------------------------------------------------------------------------
// ProfileRepository implementation
// ---------------------------------------------------------------------------

impl ProfileRepository for SqliteProfileRepository {
    async fn create(&self, profile: &Profile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO profiles (id, tier, daily_message_count, image_generation_count, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(profile.user_id.to_string())
        .bind(profile.tier.to_string())
        .bind(profile.daily_message_count as i64)
        .bind(profile.image_generation_count as i64)
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("profile {} already exists", profile.user_id))
            }
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(())
    }

    async fn get(&self, user_id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let profile = ProfileRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_profile()?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    async fn set_tier(&self, user_id: &UserId, tier: Tier) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE profiles SET tier = ?, updated_at = ? WHERE id = ?")
            .bind(tier.to_string())
            .bind(format_datetime(&Utc::now()))
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn try_increment(
        &self,
        user_id: &UserId,
        counter: UsageCounter,
        limit: Option<u32>,
    ) -> Result<IncrementOutcome, RepositoryError> {
        let column = counter_column(counter);

        // Guard and increment in one statement; NULL limit means
        // unconditional (unlimited tiers are still counted).
        let sql = format!(
            "UPDATE profiles SET {column} = {column} + 1, updated_at = ?1 \
             WHERE id = ?2 AND (?3 IS NULL OR {column} < ?3) \
             RETURNING {column} AS new_value"
        );

        let row = sqlx::query(&sql)
            .bind(format_datetime(&Utc::now()))
            .bind(user_id.to_string())
            .bind(limit.map(i64::from))
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if let Some(row) = row {
            let new_value: i64 = row
                .try_get("new_value")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            return Ok(IncrementOutcome {
                committed: true,
                new_value: new_value as u32,
            });
        }

        // Guard rejected the write (or the row is gone); report the
        // current value untouched.
        let sql = format!("SELECT {column} AS value FROM profiles WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let value: i64 = row
                    .try_get("value")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(IncrementOutcome {
                    committed: false,
                    new_value: value as u32,
                })
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn reset_daily_message_counts(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE profiles SET daily_message_count = 0, updated_at = ? WHERE daily_message_count > 0",
        )
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
