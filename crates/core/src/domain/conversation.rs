use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::Intent;

/// One logged interaction. Append-only; the statistics view is derived from
/// the same totals the orchestrator accumulates as entries are written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: String,
    pub customer_id: Option<String>,
    pub query: String,
    pub intent: Intent,
    pub supported: bool,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(
        customer_id: Option<String>,
        query: impl Into<String>,
        intent: Intent,
        supported: bool,
        response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id,
            query: query.into(),
            intent,
            supported,
            response: response.into(),
            created_at: Utc::now(),
        }
    }
}
