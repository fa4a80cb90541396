use async_trait::async_trait;
use sqlx::Row;

use teller_core::domain::customer::CustomerId;
use teller_core::domain::remittance::{Remittance, RemittanceStatus, TransactionType};

use super::{
    parse_datetime, parse_decimal, parse_opt_datetime, parse_opt_decimal, RemittanceRepository,
    RepositoryError,
};
use crate::DbPool;

const REMITTANCE_COLUMNS: &str = "id, customer_id, reference_id, amount, currency, \
     sender_name, sender_account, recipient_name, recipient_account, recipient_bank, \
     recipient_country, status, transaction_type, purpose, exchange_rate, fees, net_amount, \
     initiated_date, processed_date, completed_date, failure_reason";

pub struct SqlRemittanceRepository {
    pool: DbPool,
}

impl SqlRemittanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemittanceRepository for SqlRemittanceRepository {
    async fn find_by_reference(
        &self,
        reference_id: &str,
        customer_id: Option<&CustomerId>,
    ) -> Result<Option<Remittance>, RepositoryError> {
        let row = match customer_id {
            Some(customer) => {
                sqlx::query(&format!(
                    "SELECT {REMITTANCE_COLUMNS} FROM remittances
                     WHERE reference_id = ? AND customer_id = ?"
                ))
                .bind(reference_id)
                .bind(&customer.0)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {REMITTANCE_COLUMNS} FROM remittances WHERE reference_id = ?"
                ))
                .bind(reference_id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(remittance_from_row).transpose()
    }

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<Remittance>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {REMITTANCE_COLUMNS} FROM remittances
             WHERE customer_id = ?
             ORDER BY initiated_date DESC
             LIMIT ?"
        ))
        .bind(&customer_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(remittance_from_row).collect()
    }
}

fn remittance_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Remittance, RepositoryError> {
    let status_raw: String = row.try_get("status").map_err(RepositoryError::Database)?;
    let status = RemittanceStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown remittance status `{status_raw}`")))?;

    let type_raw: String = row.try_get("transaction_type").map_err(RepositoryError::Database)?;
    let transaction_type = TransactionType::parse(&type_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown transaction type `{type_raw}`")))?;

    let amount_raw: String = row.try_get("amount").map_err(RepositoryError::Database)?;
    let fees_raw: String = row.try_get("fees").map_err(RepositoryError::Database)?;
    let initiated_raw: String = row.try_get("initiated_date").map_err(RepositoryError::Database)?;

    Ok(Remittance {
        id: row.try_get("id").map_err(RepositoryError::Database)?,
        customer_id: CustomerId(row.try_get("customer_id").map_err(RepositoryError::Database)?),
        reference_id: row.try_get("reference_id").map_err(RepositoryError::Database)?,
        amount: parse_decimal(&amount_raw, "amount")?,
        currency: row.try_get("currency").map_err(RepositoryError::Database)?,
        sender_name: row.try_get("sender_name").map_err(RepositoryError::Database)?,
        sender_account: row.try_get("sender_account").map_err(RepositoryError::Database)?,
        recipient_name: row.try_get("recipient_name").map_err(RepositoryError::Database)?,
        recipient_account: row.try_get("recipient_account").map_err(RepositoryError::Database)?,
        recipient_bank: row.try_get("recipient_bank").map_err(RepositoryError::Database)?,
        recipient_country: row.try_get("recipient_country").map_err(RepositoryError::Database)?,
        status,
        transaction_type,
        purpose: row.try_get("purpose").map_err(RepositoryError::Database)?,
        exchange_rate: parse_opt_decimal(
            row.try_get("exchange_rate").map_err(RepositoryError::Database)?,
            "exchange_rate",
        )?,
        fees: parse_decimal(&fees_raw, "fees")?,
        net_amount: parse_opt_decimal(
            row.try_get("net_amount").map_err(RepositoryError::Database)?,
            "net_amount",
        )?,
        initiated_date: parse_datetime(&initiated_raw, "initiated_date")?,
        processed_date: parse_opt_datetime(
            row.try_get("processed_date").map_err(RepositoryError::Database)?,
            "processed_date",
        )?,
        completed_date: parse_opt_datetime(
            row.try_get("completed_date").map_err(RepositoryError::Database)?,
            "completed_date",
        )?,
        failure_reason: row.try_get("failure_reason").map_err(RepositoryError::Database)?,
    })
}
