mod schema;

#[cfg(test)]
mod tests;

pub use schema::{OpportunityRow, COLUMNS, TABLE_NAME};

use harvester_core::{DatabaseError, Opportunity, OpportunityStore};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Storage gateway for the `opportunities` table.
///
/// Holds only the connection string; every operation opens its own
/// connection and closes it before returning, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct Database {
    connection_string: String,
}

impl Database {
    pub fn new(connection_string: String) -> Self {
        Self { connection_string }
    }

    async fn connect(&self) -> Result<SqliteConnection, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&self.connection_string)
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: format!("invalid connection string: {}", e),
            })?
            .create_if_missing(true);

        options
            .connect()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })
    }

    async fn release(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection: {}", e);
        }
    }

    /// Creates the table if absent and adds any column an older table lacks.
    /// Existing rows are left untouched, so this is safe on every startup.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let mut conn = self.connect().await?;
        let result = Self::apply_schema(&mut conn).await;
        Self::release(conn).await;
        result
    }

    async fn apply_schema(conn: &mut SqliteConnection) -> Result<(), DatabaseError> {
        sqlx::query(&schema::create_table_sql())
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::MigrationFailed {
                migration: format!("create table {}: {}", TABLE_NAME, e),
            })?;

        let existing = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?)")
            .bind(TABLE_NAME)
            .fetch_all(&mut *conn)
            .await?;

        for (name, ty) in COLUMNS {
            if existing.iter().any(|column| column.eq_ignore_ascii_case(name)) {
                continue;
            }
            info!("Adding missing column {} to {}", name, TABLE_NAME);
            sqlx::query(&schema::add_column_sql(name, ty))
                .execute(&mut *conn)
                .await
                .map_err(|e| DatabaseError::MigrationFailed {
                    migration: format!("add column {}: {}", name, e),
                })?;
        }

        let encoding = sqlx::query_scalar::<_, String>("PRAGMA encoding")
            .fetch_one(&mut *conn)
            .await?;
        if !encoding.starts_with("UTF-8") {
            warn!(
                "Database encoding is {}, expected UTF-8; text is stored as-is",
                encoding
            );
        }

        debug!("Schema for {} is in place", TABLE_NAME);
        Ok(())
    }

    /// Inserts every record in one transaction. The first failing insert
    /// aborts the batch and nothing from it is committed.
    pub async fn persist(&self, records: &[Opportunity]) -> Result<usize, DatabaseError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect().await?;
        let result = Self::insert_batch(&mut conn, records).await;
        Self::release(conn).await;

        match &result {
            Ok(count) => info!("Saved {} items to database", count),
            Err(e) => error!("Error saving batch of {} items: {}", records.len(), e),
        }
        result
    }

    async fn insert_batch(
        conn: &mut SqliteConnection,
        records: &[Opportunity],
    ) -> Result<usize, DatabaseError> {
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed {
                reason: e.to_string(),
            })?;

        let sql = schema::insert_sql();
        for (index, record) in records.iter().enumerate() {
            bind_record(sqlx::query(&sql), record)
                .execute(&mut *tx)
                .await
                .map_err(|e| DatabaseError::InsertFailed {
                    index,
                    post_id: record
                        .post_id
                        .clone()
                        .unwrap_or_else(|| "<none>".to_string()),
                    reason: e.to_string(),
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed {
                reason: e.to_string(),
            })?;

        Ok(records.len())
    }

    /// All stored rows in insertion order.
    pub async fn fetch_all(&self) -> Result<Vec<Opportunity>, DatabaseError> {
        let mut conn = self.connect().await?;
        let sql = schema::select_all_sql();
        let result = sqlx::query_as::<_, OpportunityRow>(&sql)
            .fetch_all(&mut conn)
            .await
            .map_err(DatabaseError::from);
        Self::release(conn).await;

        let rows = result?;
        debug!("Fetched {} rows from {}", rows.len(), TABLE_NAME);
        Ok(rows.into_iter().map(Opportunity::from).collect())
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let mut conn = self.connect().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", TABLE_NAME);
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut conn)
            .await
            .map_err(DatabaseError::from);
        Self::release(conn).await;
        result
    }
}

fn bind_record<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &Opportunity,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(record.post_id.clone())
        .bind(record.author_id.clone())
        .bind(record.created_utc)
        .bind(record.title.clone())
        .bind(record.text.clone())
        .bind(record.subreddit.clone())
        .bind(record.subreddit_subscribers)
        .bind(record.score)
        .bind(record.num_comments)
        .bind(record.opportunity_description.clone())
        .bind(record.likes)
        .bind(record.dislikes)
        .bind(record.url.clone())
        .bind(record.liked_by_me)
        .bind(record.disliked_by_me)
        .bind(record.saved_by_me)
        .bind(record.category.clone())
        .bind(record.is_new)
}

impl OpportunityStore for Database {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        Database::ensure_schema(self).await
    }

    async fn persist(&self, records: &[Opportunity]) -> Result<usize, DatabaseError> {
        Database::persist(self, records).await
    }
}
