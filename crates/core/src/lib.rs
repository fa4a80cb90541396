pub mod config;
pub mod domain;
pub mod intent;
pub mod permissions;
pub mod session;
pub mod stats;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::conversation::ConversationEntry;
pub use domain::customer::{AccountStatus, Customer, CustomerId, CustomerTier};
pub use domain::remittance::{Remittance, RemittanceStatus, TransactionType};
pub use intent::Intent;
pub use session::{credential_digest, SessionClaims, SessionError, SessionSigner};
pub use stats::{StatsAggregator, StatsSnapshot};
