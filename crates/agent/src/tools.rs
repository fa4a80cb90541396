use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use teller_core::domain::customer::CustomerId;
use teller_core::domain::remittance::Remittance;
use teller_core::intent::Intent;
use teller_db::repositories::{RemittanceRepository, RepositoryError};

const RECENT_REMITTANCE_LIMIT: u32 = 5;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no matching record found")]
    NotFound,
    #[error("this request requires an authenticated customer")]
    CustomerRequired,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Executes the handler behind a supported intent and renders a customer
/// facing reply. Balance and history are canned demo responses; remittance
/// lookups go through the repository.
pub struct ToolDispatcher {
    remittances: Arc<dyn RemittanceRepository>,
}

impl ToolDispatcher {
    pub fn new(remittances: Arc<dyn RemittanceRepository>) -> Self {
        Self { remittances }
    }

    pub async fn execute(
        &self,
        intent: Intent,
        query: &str,
        customer_id: Option<&CustomerId>,
        customer_name: Option<&str>,
    ) -> Result<String, ToolError> {
        match intent {
            Intent::RemittanceStatus => self.remittance_status(query, customer_id).await,
            Intent::AccountBalance => Ok(account_balance(customer_name)),
            Intent::TransactionHistory => Ok(transaction_history(customer_name)),
            Intent::GeneralBanking => Ok(general_banking()),
            Intent::InvestmentQuery
            | Intent::LoanInquiry
            | Intent::CardServices
            | Intent::OutOfScope => Err(ToolError::NotFound),
        }
    }

    async fn remittance_status(
        &self,
        query: &str,
        customer_id: Option<&CustomerId>,
    ) -> Result<String, ToolError> {
        let customer_id = customer_id.ok_or(ToolError::CustomerRequired)?;

        if let Some(reference) = extract_reference(query) {
            let remittance = self
                .remittances
                .find_by_reference(&reference, Some(customer_id))
                .await?
                .ok_or(ToolError::NotFound)?;
            return Ok(render_remittance_detail(&remittance));
        }

        let recent =
            self.remittances.list_for_customer(customer_id, RECENT_REMITTANCE_LIMIT).await?;
        if recent.is_empty() {
            return Err(ToolError::NotFound);
        }
        Ok(render_remittance_overview(&recent))
    }
}

/// Picks a transfer reference out of free text. References look like
/// `RF001A`: alphanumeric, at least one letter and one digit, four or more
/// characters. Purely numeric tokens are amounts, not references.
pub fn extract_reference(query: &str) -> Option<String> {
    query
        .split_whitespace()
        .map(|token| token.trim_matches(|ch: char| !ch.is_ascii_alphanumeric()))
        .filter(|token| token.len() >= 4)
        .filter(|token| token.chars().all(|ch| ch.is_ascii_alphanumeric()))
        .filter(|token| token.chars().any(|ch| ch.is_ascii_digit()))
        .find(|token| token.chars().any(|ch| ch.is_ascii_uppercase()))
        .map(str::to_string)
}

fn render_remittance_detail(remittance: &Remittance) -> String {
    let mut reply = format!(
        "Your transfer {} for {} {} to {} ({}) is currently {}.",
        remittance.reference_id,
        remittance.amount,
        remittance.currency,
        remittance.recipient_name,
        remittance.recipient_country,
        remittance.status.display_label().to_lowercase(),
    );
    if let Some(completed) = remittance.completed_date {
        let _ = write!(reply, " It was completed on {}.", completed.format("%d %b %Y"));
    }
    if let Some(reason) = &remittance.failure_reason {
        let _ = write!(reply, " Reason: {reason}.");
    }
    let _ = write!(
        reply,
        " Fees charged: {} {}.",
        remittance.fees, remittance.currency
    );
    reply
}

/// Status summary followed by the recent transfers, for queries that name no
/// particular reference.
fn render_remittance_overview(remittances: &[Remittance]) -> String {
    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    for remittance in remittances {
        *by_status.entry(remittance.status.as_str()).or_insert(0) += 1;
    }
    let breakdown = by_status
        .iter()
        .map(|(label, count)| format!("{count} {label}"))
        .collect::<Vec<_>>()
        .join(", ");

    let plural = if remittances.len() == 1 { "" } else { "s" };
    let mut reply =
        format!("You have {} recent transfer{plural} ({breakdown}):\n", remittances.len());
    for remittance in remittances {
        let _ = writeln!(
            reply,
            "- {}: {} {} to {}, {} (initiated {})",
            remittance.reference_id,
            remittance.amount,
            remittance.currency,
            remittance.recipient_name,
            remittance.status.display_label().to_lowercase(),
            remittance.initiated_date.format("%d %b %Y"),
        );
    }
    reply.push_str("Share a reference number for full details on any transfer.");
    reply
}

fn account_balance(customer_name: Option<&str>) -> String {
    let greeting = match customer_name {
        Some(name) => format!("Hello {name}, your"),
        None => "Your".to_string(),
    };
    format!(
        "{greeting} Savings account balance is $125,000.00. \
         Funds on hold: $0.00. Available to spend: $125,000.00."
    )
}

fn transaction_history(customer_name: Option<&str>) -> String {
    let greeting = match customer_name {
        Some(name) => format!("Hello {name}, here"),
        None => "Here".to_string(),
    };
    format!(
        "{greeting} are your three most recent transactions:\n\
         - Salary credit: +$8,500.00\n\
         - Utility bill payment: -$220.00\n\
         - Grocery purchase: -$156.45\n\
         For a full statement, visit any branch or use net banking."
    )
}

fn general_banking() -> String {
    "Our branches are open Monday to Friday, 9:00 AM to 5:00 PM, and Saturdays \
     until 1:00 PM. Phone and net banking are available around the clock. \
     For anything account specific, please sign in first."
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use teller_core::domain::customer::CustomerId;
    use teller_core::domain::remittance::{Remittance, RemittanceStatus, TransactionType};
    use teller_core::intent::Intent;
    use teller_db::repositories::InMemoryRemittanceRepository;

    use super::{extract_reference, ToolDispatcher, ToolError};

    fn sample_remittance(reference: &str, customer: &str, status: RemittanceStatus) -> Remittance {
        Remittance {
            id: format!("rem-{reference}"),
            customer_id: CustomerId(customer.to_string()),
            reference_id: reference.to_string(),
            amount: Decimal::new(5_000_00, 2),
            currency: "USD".to_string(),
            sender_name: "Rajesh Sharma".to_string(),
            sender_account: None,
            recipient_name: "Anita Sharma".to_string(),
            recipient_account: None,
            recipient_bank: None,
            recipient_country: "United States".to_string(),
            status,
            transaction_type: TransactionType::International,
            purpose: None,
            exchange_rate: None,
            fees: Decimal::new(25_00, 2),
            net_amount: None,
            initiated_date: Utc::now() - Duration::days(2),
            processed_date: None,
            completed_date: matches!(status, RemittanceStatus::Completed)
                .then(|| Utc::now() - Duration::days(1)),
            failure_reason: None,
        }
    }

    #[test]
    fn reference_extraction_finds_mixed_alphanumeric_tokens() {
        assert_eq!(
            extract_reference("what is the status of RF001A?"),
            Some("RF001A".to_string())
        );
        assert_eq!(extract_reference("check transfer (RF002B)"), Some("RF002B".to_string()));
        assert_eq!(extract_reference("I sent 5000 dollars yesterday"), None);
        assert_eq!(extract_reference("where is my money"), None);
    }

    #[tokio::test]
    async fn remittance_lookup_renders_status_for_owner() {
        let repo = Arc::new(InMemoryRemittanceRepository::new());
        repo.insert(sample_remittance("RF001A", "CUST001", RemittanceStatus::Completed)).await;
        let dispatcher = ToolDispatcher::new(repo);

        let owner = CustomerId("CUST001".to_string());
        let reply = dispatcher
            .execute(Intent::RemittanceStatus, "status of RF001A", Some(&owner), None)
            .await
            .expect("tool reply");
        assert!(reply.contains("RF001A"));
        assert!(reply.contains("completed"));
    }

    #[tokio::test]
    async fn remittance_lookup_without_reference_lists_recent_transfers() {
        let repo = Arc::new(InMemoryRemittanceRepository::new());
        repo.insert(sample_remittance("RF001A", "CUST001", RemittanceStatus::Completed)).await;
        repo.insert(sample_remittance("RF002B", "CUST001", RemittanceStatus::Processing)).await;
        let dispatcher = ToolDispatcher::new(repo);

        let owner = CustomerId("CUST001".to_string());
        let reply = dispatcher
            .execute(Intent::RemittanceStatus, "show my recent transfers", Some(&owner), None)
            .await
            .expect("tool reply");
        assert!(reply.contains("RF001A"));
        assert!(reply.contains("RF002B"));
    }

    #[tokio::test]
    async fn recent_transfer_overview_summarizes_statuses() {
        let repo = Arc::new(InMemoryRemittanceRepository::new());
        repo.insert(sample_remittance("RF001A", "CUST001", RemittanceStatus::Completed)).await;
        repo.insert(sample_remittance("RF002B", "CUST001", RemittanceStatus::Completed)).await;
        repo.insert(sample_remittance("RF003C", "CUST001", RemittanceStatus::Processing)).await;
        let dispatcher = ToolDispatcher::new(repo);

        let owner = CustomerId("CUST001".to_string());
        let reply = dispatcher
            .execute(Intent::RemittanceStatus, "how are my transfers doing", Some(&owner), None)
            .await
            .expect("tool reply");
        assert!(reply.contains("3 recent transfers"));
        assert!(reply.contains("2 completed"));
        assert!(reply.contains("1 processing"));
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let repo = Arc::new(InMemoryRemittanceRepository::new());
        let dispatcher = ToolDispatcher::new(repo);

        let owner = CustomerId("CUST001".to_string());
        let result = dispatcher
            .execute(Intent::RemittanceStatus, "status of RF999Z", Some(&owner), None)
            .await;
        assert!(matches!(result, Err(ToolError::NotFound)));
    }

    #[tokio::test]
    async fn remittance_status_requires_a_customer() {
        let repo = Arc::new(InMemoryRemittanceRepository::new());
        let dispatcher = ToolDispatcher::new(repo);

        let result =
            dispatcher.execute(Intent::RemittanceStatus, "status of RF001A", None, None).await;
        assert!(matches!(result, Err(ToolError::CustomerRequired)));
    }

    #[tokio::test]
    async fn balance_reply_greets_the_customer_by_name() {
        let repo = Arc::new(InMemoryRemittanceRepository::new());
        let dispatcher = ToolDispatcher::new(repo);

        let owner = CustomerId("CUST001".to_string());
        let reply = dispatcher
            .execute(Intent::AccountBalance, "balance please", Some(&owner), Some("Rajesh"))
            .await
            .expect("tool reply");
        assert!(reply.contains("Rajesh"));
        assert!(reply.contains("$125,000.00"));
    }
}
