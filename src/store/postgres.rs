use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{LogStore, Page, StoreError};
use crate::models::{LogEntry, LogField, LogId, ProjectedLog, Projection};

/// Table holding one row per log entry.
pub const LOGS_TABLE: &str = "logs";

/// PostgreSQL-backed store. Cloning shares the same pool.
#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;

        info!("Database migrations applied");
        Ok(())
    }
}

/// `SELECT <columns> FROM logs ORDER BY seq LIMIT $1 OFFSET $2`. Column
/// names come from `LogField`, never from the request.
fn projection_query(projection: &Projection) -> String {
    let columns: Vec<&str> = projection.fields().iter().map(|f| f.column()).collect();
    format!(
        "SELECT {} FROM {} ORDER BY seq ASC LIMIT $1 OFFSET $2",
        columns.join(", "),
        LOGS_TABLE
    )
}

fn decode_row(row: &PgRow, projection: &Projection) -> Result<ProjectedLog, StoreError> {
    let mut projected = ProjectedLog::default();
    for field in projection.fields() {
        let column = field.column();
        let corrupt = |e: sqlx::Error| StoreError::Corrupt(format!("{column}: {e}"));
        match field {
            LogField::Timestamp => {
                projected.timestamp = Some(row.try_get::<DateTime<Utc>, _>(column).map_err(corrupt)?)
            }
            LogField::Mood => projected.mood = Some(row.try_get::<i16, _>(column).map_err(corrupt)?),
            LogField::VideoUri => {
                projected.video_uri = Some(row.try_get::<String, _>(column).map_err(corrupt)?)
            }
            LogField::Lat => projected.lat = Some(row.try_get::<f64, _>(column).map_err(corrupt)?),
            LogField::Lng => projected.lng = Some(row.try_get::<f64, _>(column).map_err(corrupt)?),
        }
    }
    Ok(projected)
}

#[async_trait]
impl LogStore for PgLogStore {
    #[instrument(skip(self, entry), fields(mood = entry.mood))]
    async fn insert(&self, entry: &LogEntry) -> Result<LogId, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO logs (id, logged_at, mood, video_uri, lat, lng)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(entry.timestamp)
        .bind(entry.mood)
        .bind(&entry.video_uri)
        .bind(entry.lat)
        .bind(entry.lng)
        .execute(&self.pool)
        .await?;

        debug!(%id, "Log entry stored");
        Ok(id)
    }

    #[instrument(skip(self, projection))]
    async fn query_projection(
        &self,
        projection: &Projection,
        page: Page,
    ) -> Result<Vec<ProjectedLog>, StoreError> {
        let sql = projection_query(projection);
        let offset = i64::try_from(page.offset).unwrap_or(i64::MAX);

        let rows = sqlx::query(&sql)
            .bind(page.limit.map(i64::from))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "Projection read");
        rows.iter().map(|row| decode_row(row, projection)).collect()
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_query_selects_only_requested_columns() {
        let projection = Projection::new(&[LogField::Mood, LogField::Timestamp]);
        assert_eq!(
            projection_query(&projection),
            "SELECT logged_at, mood FROM logs ORDER BY seq ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_empty_projection_still_selects_a_column() {
        assert_eq!(
            projection_query(&Projection::new(&[])),
            "SELECT logged_at FROM logs ORDER BY seq ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_projection_query_never_selects_id() {
        let projection = Projection::new(&[
            LogField::Timestamp,
            LogField::Mood,
            LogField::VideoUri,
            LogField::Lat,
            LogField::Lng,
        ]);
        let sql = projection_query(&projection);
        assert!(!sql.contains(" id"));
        assert!(sql.contains("video_uri"));
    }
}
