//! In-memory repositories for tests and offline development.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use teller_core::domain::conversation::ConversationEntry;
use teller_core::domain::customer::{Customer, CustomerId};
use teller_core::domain::remittance::Remittance;
use teller_core::intent::Intent;

use super::{
    ConversationRepository, CustomerRepository, RemittanceRepository, RepositoryError,
    SupportCount,
};

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<String, Customer>>,
    credentials: RwLock<HashMap<String, String>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, customer: Customer, credential_digest: impl Into<String>) {
        self.credentials
            .write()
            .await
            .insert(customer.id.0.clone(), credential_digest.into());
        self.customers.write().await.insert(customer.id.0.clone(), customer);
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.customers.read().await.get(&id.0).cloned())
    }

    async fn credential_digest(
        &self,
        id: &CustomerId,
    ) -> Result<Option<String>, RepositoryError> {
        Ok(self.credentials.read().await.get(&id.0).cloned())
    }

    async fn record_login_success(
        &self,
        id: &CustomerId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if let Some(customer) = self.customers.write().await.get_mut(&id.0) {
            customer.failed_attempts = 0;
            customer.locked_until = None;
            customer.last_login = Some(at);
        }
        Ok(())
    }

    async fn record_login_failure(
        &self,
        id: &CustomerId,
        failed_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        if let Some(customer) = self.customers.write().await.get_mut(&id.0) {
            customer.failed_attempts = failed_attempts;
            customer.locked_until = locked_until;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRemittanceRepository {
    remittances: RwLock<Vec<Remittance>>,
}

impl InMemoryRemittanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, remittance: Remittance) {
        self.remittances.write().await.push(remittance);
    }
}

#[async_trait]
impl RemittanceRepository for InMemoryRemittanceRepository {
    async fn find_by_reference(
        &self,
        reference_id: &str,
        customer_id: Option<&CustomerId>,
    ) -> Result<Option<Remittance>, RepositoryError> {
        let remittances = self.remittances.read().await;
        Ok(remittances
            .iter()
            .find(|remittance| {
                remittance.reference_id == reference_id
                    && customer_id.map_or(true, |id| &remittance.customer_id == id)
            })
            .cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<Remittance>, RepositoryError> {
        let remittances = self.remittances.read().await;
        let mut matching: Vec<Remittance> = remittances
            .iter()
            .filter(|remittance| &remittance.customer_id == customer_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.initiated_date.cmp(&a.initiated_date));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    entries: RwLock<Vec<ConversationEntry>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn append(&self, entry: ConversationEntry) -> Result<(), RepositoryError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list(
        &self,
        customer_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ConversationEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<ConversationEntry> = entries
            .iter()
            .filter(|entry| {
                customer_id.map_or(true, |id| entry.customer_id.as_deref() == Some(id))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn support_counts(&self) -> Result<Vec<SupportCount>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut counts: BTreeMap<(Intent, bool), u64> = BTreeMap::new();
        for entry in entries.iter() {
            *counts.entry((entry.intent, entry.supported)).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((intent, supported), count)| SupportCount { intent, supported, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use teller_core::domain::customer::{AccountStatus, Customer, CustomerId, CustomerTier};
    use teller_core::intent::Intent;
    use teller_core::session::credential_digest;

    use super::*;

    fn sample_customer(id: &str, tier: CustomerTier) -> Customer {
        Customer {
            id: CustomerId(id.to_string()),
            name: "Test Customer".to_string(),
            email: format!("{}@example.com", id.to_lowercase()),
            phone: None,
            tier,
            account_status: AccountStatus::Active,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    #[tokio::test]
    async fn customer_lock_state_is_mutable() {
        let repo = InMemoryCustomerRepository::new();
        let id = CustomerId("CUST010".to_string());
        repo.insert(sample_customer("CUST010", CustomerTier::Regular), credential_digest("pw"))
            .await;

        let locked_until = Utc::now() + Duration::minutes(15);
        repo.record_login_failure(&id, 3, Some(locked_until)).await.expect("failure");
        let customer = repo.find_by_id(&id).await.expect("query").expect("exists");
        assert!(customer.is_locked(Utc::now()));

        repo.record_login_success(&id, Utc::now()).await.expect("success");
        let customer = repo.find_by_id(&id).await.expect("query").expect("exists");
        assert_eq!(customer.failed_attempts, 0);
        assert!(customer.locked_until.is_none());
    }

    #[tokio::test]
    async fn conversation_list_filters_and_limits() {
        let repo = InMemoryConversationRepository::new();
        for index in 0..5 {
            let mut entry = ConversationEntry::new(
                Some("CUST010".to_string()),
                format!("query {index}"),
                Intent::GeneralBanking,
                true,
                "ok",
            );
            entry.created_at = Utc::now() + Duration::seconds(index);
            repo.append(entry).await.expect("append");
        }
        repo.append(ConversationEntry::new(
            None,
            "anonymous",
            Intent::GeneralBanking,
            true,
            "ok",
        ))
        .await
        .expect("append");

        let listed = repo.list(Some("CUST010"), 3).await.expect("list");
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].query, "query 4");
    }
}
