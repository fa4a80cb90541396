use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use teller_core::domain::conversation::ConversationEntry;
use teller_core::domain::customer::{Customer, CustomerId};
use teller_core::domain::remittance::Remittance;
use teller_core::intent::Intent;

pub mod conversation;
pub mod customer;
pub mod memory;
pub mod remittance;

pub use conversation::SqlConversationRepository;
pub use customer::SqlCustomerRepository;
pub use memory::{
    InMemoryConversationRepository, InMemoryCustomerRepository, InMemoryRemittanceRepository,
};
pub use remittance::SqlRemittanceRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// SHA-256 hex digest of the stored login credential, kept out of the
    /// `Customer` record itself.
    async fn credential_digest(&self, id: &CustomerId)
        -> Result<Option<String>, RepositoryError>;

    async fn record_login_success(
        &self,
        id: &CustomerId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn record_login_failure(
        &self,
        id: &CustomerId,
        failed_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RemittanceRepository: Send + Sync {
    /// Look up by reference id, optionally scoped to a customer so one
    /// customer cannot read another's transfers.
    async fn find_by_reference(
        &self,
        reference_id: &str,
        customer_id: Option<&CustomerId>,
    ) -> Result<Option<Remittance>, RepositoryError>;

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<Remittance>, RepositoryError>;
}

/// One aggregated row of the conversation log: how many entries share an
/// intent and support flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportCount {
    pub intent: Intent,
    pub supported: bool,
    pub count: u64,
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn append(&self, entry: ConversationEntry) -> Result<(), RepositoryError>;

    /// Most recent first; `customer_id` filters to a single customer.
    async fn list(
        &self,
        customer_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ConversationEntry>, RepositoryError>;

    /// Counts over the full log, grouped by intent and support flag.
    async fn support_counts(&self) -> Result<Vec<SupportCount>, RepositoryError>;
}

pub(crate) fn parse_datetime(raw: &str, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}

pub(crate) fn parse_opt_datetime(
    raw: Option<String>,
    column: &str,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    raw.map(|value| parse_datetime(&value, column)).transpose()
}

pub(crate) fn parse_decimal(raw: &str, column: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>()
        .map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}

pub(crate) fn parse_opt_decimal(
    raw: Option<String>,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    raw.map(|value| parse_decimal(&value, column)).transpose()
}
