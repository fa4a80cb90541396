use async_trait::async_trait;
use sqlx::Row;

use teller_core::domain::conversation::ConversationEntry;
use teller_core::intent::Intent;

use super::{parse_datetime, ConversationRepository, RepositoryError, SupportCount};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn append(&self, entry: ConversationEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO conversations
                 (id, customer_id, query, intent, supported, response, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(&entry.query)
        .bind(entry.intent.as_str())
        .bind(i64::from(entry.supported))
        .bind(&entry.response)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(
        &self,
        customer_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ConversationEntry>, RepositoryError> {
        let rows = match customer_id {
            Some(customer) => {
                sqlx::query(
                    "SELECT id, customer_id, query, intent, supported, response, created_at
                     FROM conversations
                     WHERE customer_id = ?
                     ORDER BY created_at DESC
                     LIMIT ?",
                )
                .bind(customer)
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, customer_id, query, intent, supported, response, created_at
                     FROM conversations
                     ORDER BY created_at DESC
                     LIMIT ?",
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn support_counts(&self) -> Result<Vec<SupportCount>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT intent, supported, COUNT(*) AS count
             FROM conversations
             GROUP BY intent, supported",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let intent_raw: String =
                    row.try_get("intent").map_err(RepositoryError::Database)?;
                let intent = Intent::parse(&intent_raw).ok_or_else(|| {
                    RepositoryError::Decode(format!("unknown intent `{intent_raw}`"))
                })?;
                let supported: i64 = row.try_get("supported").map_err(RepositoryError::Database)?;
                let count: i64 = row.try_get("count").map_err(RepositoryError::Database)?;
                Ok(SupportCount { intent, supported: supported != 0, count: count as u64 })
            })
            .collect()
    }
}

fn entry_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ConversationEntry, RepositoryError> {
    let intent_raw: String = row.try_get("intent").map_err(RepositoryError::Database)?;
    let intent = Intent::parse(&intent_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown intent `{intent_raw}`")))?;

    let supported: i64 = row.try_get("supported").map_err(RepositoryError::Database)?;
    let created_raw: String = row.try_get("created_at").map_err(RepositoryError::Database)?;

    Ok(ConversationEntry {
        id: row.try_get("id").map_err(RepositoryError::Database)?,
        customer_id: row.try_get("customer_id").map_err(RepositoryError::Database)?,
        query: row.try_get("query").map_err(RepositoryError::Database)?,
        intent,
        supported: supported != 0,
        response: row.try_get("response").map_err(RepositoryError::Database)?,
        created_at: parse_datetime(&created_raw, "created_at")?,
    })
}
