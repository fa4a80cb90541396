//! Conversational banking agent: intent classification, authentication,
//! permission checks, and the canned tool handlers behind each intent.

pub mod auth;
pub mod classifier;
pub mod llm;
pub mod orchestrator;
pub mod tools;

pub use auth::{AuthError, AuthService, AuthenticatedSession};
pub use classifier::IntentClassifier;
pub use llm::{LlmClient, LlmError, OpenAiChatClient};
pub use orchestrator::{Orchestrator, QueryOutcome, QueryRequest};
pub use tools::{ToolDispatcher, ToolError};
