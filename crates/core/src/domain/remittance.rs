use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::customer::CustomerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemittanceStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RemittanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Legal lifecycle: pending → processing → completed | failed | cancelled.
    /// Terminal states admit no further transitions.
    pub fn can_transition_to(&self, next: RemittanceStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Cancelled)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
                | (Self::Processing, Self::Cancelled)
        )
    }

    /// Human-facing label, e.g. "Completed".
    pub fn display_label(&self) -> String {
        let raw = self.as_str();
        let mut label = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        if let Some(first) = chars.next() {
            label.extend(first.to_uppercase());
            label.extend(chars);
        }
        label
    }
}

impl std::fmt::Display for RemittanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Domestic,
    International,
    WireTransfer,
    Ach,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::International => "international",
            Self::WireTransfer => "wire_transfer",
            Self::Ach => "ach",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "domestic" => Some(Self::Domestic),
            "international" => Some(Self::International),
            "wire_transfer" => Some(Self::WireTransfer),
            "ach" => Some(Self::Ach),
            _ => None,
        }
    }
}

/// A money-transfer record. Read-only from the chatbot's perspective; status
/// transitions happen upstream in the payments stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remittance {
    pub id: String,
    pub customer_id: CustomerId,
    pub reference_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub sender_name: String,
    pub sender_account: Option<String>,
    pub recipient_name: String,
    pub recipient_account: Option<String>,
    pub recipient_bank: Option<String>,
    pub recipient_country: String,
    pub status: RemittanceStatus,
    pub transaction_type: TransactionType,
    pub purpose: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub fees: Decimal,
    pub net_amount: Option<Decimal>,
    pub initiated_date: DateTime<Utc>,
    pub processed_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::RemittanceStatus;

    #[test]
    fn lifecycle_transitions_are_enforced() {
        use RemittanceStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
    }

    #[test]
    fn display_label_is_title_cased() {
        assert_eq!(RemittanceStatus::Completed.display_label(), "Completed");
        assert_eq!(RemittanceStatus::Processing.display_label(), "Processing");
    }
}
