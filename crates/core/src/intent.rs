use serde::{Deserialize, Serialize};

/// Closed vocabulary of query intents the classifier may produce.
///
/// Only a subset is automatable (see [`Intent::is_supported`]); the rest is
/// either gated behind higher tiers or handed back to a human relationship
/// manager via the apology path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    RemittanceStatus,
    AccountBalance,
    TransactionHistory,
    InvestmentQuery,
    LoanInquiry,
    CardServices,
    GeneralBanking,
    OutOfScope,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::RemittanceStatus,
        Intent::AccountBalance,
        Intent::TransactionHistory,
        Intent::InvestmentQuery,
        Intent::LoanInquiry,
        Intent::CardServices,
        Intent::GeneralBanking,
        Intent::OutOfScope,
    ];

    /// Intents serviced automatically by a tool handler.
    pub const SUPPORTED: [Intent; 4] = [
        Intent::RemittanceStatus,
        Intent::AccountBalance,
        Intent::TransactionHistory,
        Intent::GeneralBanking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemittanceStatus => "REMITTANCE_STATUS",
            Self::AccountBalance => "ACCOUNT_BALANCE",
            Self::TransactionHistory => "TRANSACTION_HISTORY",
            Self::InvestmentQuery => "INVESTMENT_QUERY",
            Self::LoanInquiry => "LOAN_INQUIRY",
            Self::CardServices => "CARD_SERVICES",
            Self::GeneralBanking => "GENERAL_BANKING",
            Self::OutOfScope => "OUT_OF_SCOPE",
        }
    }

    /// Parse a raw classifier label. Tolerates surrounding whitespace and
    /// casing; anything outside the vocabulary yields `None` so callers can
    /// fall back to [`Intent::OutOfScope`] explicitly.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "REMITTANCE_STATUS" => Some(Self::RemittanceStatus),
            "ACCOUNT_BALANCE" => Some(Self::AccountBalance),
            "TRANSACTION_HISTORY" => Some(Self::TransactionHistory),
            "INVESTMENT_QUERY" => Some(Self::InvestmentQuery),
            "LOAN_INQUIRY" => Some(Self::LoanInquiry),
            "CARD_SERVICES" => Some(Self::CardServices),
            "GENERAL_BANKING" => Some(Self::GeneralBanking),
            "OUT_OF_SCOPE" => Some(Self::OutOfScope),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
