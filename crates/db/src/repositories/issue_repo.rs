//! Repository for the `issues` table.

use campus_core::issue::NewIssue;
use campus_core::mutation::StatusUpdate;
use sqlx::PgPool;

use crate::models::issue::IssueRow;

/// Column list for `issues` queries.
const COLUMNS: &str = "\
    id, description, category, severity, status, \
    latitude, longitude, address, photo_urls, ai_classification, \
    reporter_id, reported_at, updated_at, resolved_at, response_time_ms";

/// Provides reads and writes for issues.
pub struct IssueRepo;

impl IssueRepo {
    /// Insert a new issue under `id`. Report and update times come from the
    /// database clock.
    pub async fn create(pool: &PgPool, id: &str, input: &NewIssue) -> Result<IssueRow, sqlx::Error> {
        let ai_classification = input
            .ai_classification
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let query = format!(
            "INSERT INTO issues \
                (id, description, category, severity, status, \
                 latitude, longitude, address, photo_urls, ai_classification, reporter_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(id)
            .bind(&input.description)
            .bind(input.category.as_str())
            .bind(input.severity.as_str())
            .bind(input.status.as_str())
            .bind(input.location.latitude)
            .bind(input.location.longitude)
            .bind(&input.location.address)
            .bind(&input.photo_urls)
            .bind(ai_classification)
            .bind(&input.reporter_id)
            .fetch_one(pool)
            .await
    }

    /// Find an issue by ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM issues WHERE id = $1");
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List issues newest-first, optionally limited.
    pub async fn list(pool: &PgPool, limit: Option<i64>) -> Result<Vec<IssueRow>, sqlx::Error> {
        match limit {
            Some(limit) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM issues ORDER BY reported_at DESC, id LIMIT $1"
                );
                sqlx::query_as::<_, IssueRow>(&query)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM issues ORDER BY reported_at DESC, id");
                sqlx::query_as::<_, IssueRow>(&query).fetch_all(pool).await
            }
        }
    }

    /// Apply a status update in a single write. Returns the updated row if
    /// found.
    ///
    /// Resolution stamps are only overwritten when the update carries them,
    /// so reopening an issue keeps its previous resolution record.
    pub async fn update_status(
        pool: &PgPool,
        id: &str,
        update: &StatusUpdate,
    ) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET \
                status = $1, \
                resolved_at = COALESCE($2, resolved_at), \
                response_time_ms = COALESCE($3, response_time_ms), \
                updated_at = now() \
             WHERE id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(update.status.as_str())
            .bind(update.resolved_at)
            .bind(update.response_time_ms)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
