use std::sync::Arc;

use tracing::warn;

use teller_core::intent::Intent;

use crate::llm::LlmClient;

const CLASSIFIER_PROMPT: &str = "\
You are an intent classifier for a bank's customer support chatbot. \
Classify the customer's message into exactly one of these categories:

1. REMITTANCE_STATUS - status of money transfers, remittances, wire transfers
2. ACCOUNT_BALANCE - current account balance inquiries
3. TRANSACTION_HISTORY - past transactions, statements, account activity
4. INVESTMENT_QUERY - investments, mutual funds, portfolios, market products
5. LOAN_INQUIRY - loans, mortgages, EMIs, credit lines
6. CARD_SERVICES - debit cards, credit cards, card limits, card blocking
7. GENERAL_BANKING - branch hours, banking procedures, general questions
8. OUT_OF_SCOPE - anything not related to banking services

Respond with only the category label, nothing else.";

const RETRY_SUFFIX: &str = "\n\nYour previous answer was not one of the eight labels. \
Respond with exactly one label from the list above and no other text.";

/// Maps free-form customer text onto a fixed intent vocabulary. One retry
/// with a stricter instruction; anything still unrecognized, and any
/// transport failure, classifies as OUT_OF_SCOPE.
pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, query: &str) -> Intent {
        let first = match self.llm.complete(CLASSIFIER_PROMPT, query).await {
            Ok(text) => text,
            Err(error) => {
                warn!(event_name = "intent.classify_failed", error = %error);
                return Intent::OutOfScope;
            }
        };
        if let Some(intent) = Intent::parse(&first) {
            return intent;
        }

        let retry_prompt = format!("{CLASSIFIER_PROMPT}{RETRY_SUFFIX}");
        match self.llm.complete(&retry_prompt, query).await {
            Ok(text) => Intent::parse(&text).unwrap_or_else(|| {
                warn!(event_name = "intent.unparseable", raw = %text.trim());
                Intent::OutOfScope
            }),
            Err(error) => {
                warn!(event_name = "intent.classify_failed", error = %error);
                Intent::OutOfScope
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use teller_core::intent::Intent;

    use crate::llm::{LlmClient, LlmError};

    use super::IntentClassifier;

    /// Test double that returns a fixed sequence of completions.
    pub(crate) struct ScriptedLlm {
        responses: Vec<Result<String, ()>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        pub(crate) fn new(responses: Vec<Result<String, ()>>) -> Self {
            Self { responses, calls: AtomicUsize::new(0) }
        }

        pub(crate) fn replying(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(index.min(self.responses.len().saturating_sub(1))) {
                Some(Ok(text)) => Ok(text.clone()),
                _ => Err(LlmError::MalformedResponse("scripted failure".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn clean_label_is_parsed_directly() {
        let llm = Arc::new(ScriptedLlm::replying("REMITTANCE_STATUS"));
        let classifier = IntentClassifier::new(llm.clone());

        assert_eq!(classifier.classify("where is my transfer").await, Intent::RemittanceStatus);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn noisy_label_triggers_one_retry() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("The category is probably balance related.".to_string()),
            Ok("account_balance".to_string()),
        ]));
        let classifier = IntentClassifier::new(llm.clone());

        assert_eq!(classifier.classify("how much do I have").await, Intent::AccountBalance);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn two_unparseable_answers_fall_back_to_out_of_scope() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("no idea".to_string()),
            Ok("still no idea".to_string()),
        ]));
        let classifier = IntentClassifier::new(llm.clone());

        assert_eq!(classifier.classify("???").await, Intent::OutOfScope);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_out_of_scope() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(())]));
        let classifier = IntentClassifier::new(llm);

        assert_eq!(classifier.classify("hello").await, Intent::OutOfScope);
    }
}
