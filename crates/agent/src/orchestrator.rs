use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use teller_core::domain::conversation::ConversationEntry;
use teller_core::domain::customer::Customer;
use teller_core::intent::Intent;
use teller_core::permissions;
use teller_core::stats::{StatsAggregator, StatsSnapshot};
use teller_db::repositories::{ConversationRepository, RepositoryError};

use crate::classifier::IntentClassifier;
use crate::tools::{ToolDispatcher, ToolError};

pub const APOLOGY_MESSAGE: &str = "I apologize, but I'm not able to help with that request. \
     I can assist with remittance status, account balances, transaction history, \
     and general banking questions.";

const SIGN_IN_MESSAGE: &str = "Please sign in to access account specific information. \
     General banking questions are available without signing in.";

const TIER_DENIED_MESSAGE: &str = "This service is not available on your current account plan. \
     Please speak with your relationship manager about upgrading.";

const DEGRADED_MESSAGE: &str = "I'm sorry, I was unable to retrieve that information just now. \
     Please try again in a few minutes.";

#[derive(Clone, Debug)]
pub struct QueryRequest {
    pub query: String,
    /// Verified customer for authenticated requests; `None` for anonymous.
    pub customer: Option<Customer>,
}

#[derive(Clone, Debug)]
pub struct QueryOutcome {
    pub intent: Intent,
    pub supported: bool,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Runs one customer query end to end: classify, gate on support and
/// permissions, dispatch the tool, log the exchange, update statistics.
/// Failures downstream degrade the reply; they never surface as errors.
pub struct Orchestrator {
    classifier: IntentClassifier,
    tools: ToolDispatcher,
    conversations: Arc<dyn ConversationRepository>,
    stats: StatsAggregator,
}

impl Orchestrator {
    pub fn new(
        classifier: IntentClassifier,
        tools: ToolDispatcher,
        conversations: Arc<dyn ConversationRepository>,
    ) -> Self {
        Self { classifier, tools, conversations, stats: StatsAggregator::default() }
    }

    pub async fn handle_query(&self, request: QueryRequest) -> QueryOutcome {
        let intent = self.classifier.classify(&request.query).await;
        let customer = request.customer.as_ref();

        let (supported, response) = if !intent.is_supported() {
            info!(event_name = "query.unsupported_intent", intent = %intent);
            (false, APOLOGY_MESSAGE.to_string())
        } else if let Some(denial) = permission_denial(intent, customer) {
            warn!(
                event_name = "query.permission_denied",
                intent = %intent,
                authenticated = customer.is_some(),
            );
            (false, denial)
        } else {
            let customer_id = customer.map(|c| &c.id);
            let customer_name = customer.map(|c| c.name.as_str());
            match self.tools.execute(intent, &request.query, customer_id, customer_name).await {
                Ok(reply) => (true, reply),
                Err(ToolError::NotFound) => (
                    true,
                    "I couldn't find a matching record. Please double-check the \
                     reference number and try again."
                        .to_string(),
                ),
                Err(error) => {
                    error!(event_name = "query.tool_failed", intent = %intent, error = %error);
                    (true, DEGRADED_MESSAGE.to_string())
                }
            }
        };

        let entry = ConversationEntry::new(
            customer.map(|c| c.id.0.clone()),
            request.query.clone(),
            intent,
            supported,
            response.clone(),
        );
        let timestamp = entry.created_at;
        if let Err(error) = self.conversations.append(entry).await {
            error!(event_name = "query.log_failed", error = %error);
        }
        self.stats.record(intent, supported);

        QueryOutcome { intent, supported, response, timestamp }
    }

    pub fn statistics(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Replays the persisted conversation log into the statistics counters,
    /// so totals cover all logged entries rather than one process lifetime.
    pub async fn restore_statistics(&self) -> Result<(), RepositoryError> {
        for row in self.conversations.support_counts().await? {
            self.stats.preload(row.intent, row.supported, row.count);
        }
        Ok(())
    }
}

fn permission_denial(intent: Intent, customer: Option<&Customer>) -> Option<String> {
    match customer {
        Some(customer) if permissions::is_allowed(customer.tier, intent) => None,
        Some(_) => Some(TIER_DENIED_MESSAGE.to_string()),
        None if permissions::is_public(intent) => None,
        None => Some(SIGN_IN_MESSAGE.to_string()),
    }
}
