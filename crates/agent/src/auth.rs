use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use teller_core::config::AuthConfig;
use teller_core::domain::customer::{AccountStatus, Customer, CustomerId};
use teller_core::session::{credential_digest, SessionError, SessionSigner};
use teller_db::repositories::{CustomerRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("customer id or credential is incorrect")]
    InvalidCredentials,
    #[error("account is locked until {locked_until}")]
    AccountLocked { locked_until: DateTime<Utc> },
    #[error("account is {status}, contact support")]
    AccountInactive { status: AccountStatus },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Clone, Debug)]
pub struct AuthenticatedSession {
    pub token: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Credential checks, lockout bookkeeping, and session lifecycle.
///
/// Tokens are signed and stateless, but an issued token is only honored while
/// it is present in the active-session map, so logout revokes immediately.
pub struct AuthService {
    customers: Arc<dyn CustomerRepository>,
    signer: SessionSigner,
    sessions: RwLock<HashMap<String, CustomerId>>,
    lockout_threshold: u32,
    lockout_cooldown: Duration,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(customers: Arc<dyn CustomerRepository>, config: &AuthConfig) -> Self {
        Self {
            customers,
            signer: SessionSigner::new(config.signing_secret.clone()),
            sessions: RwLock::new(HashMap::new()),
            lockout_threshold: config.lockout_threshold.max(1),
            lockout_cooldown: Duration::seconds(config.lockout_cooldown_secs as i64),
            session_ttl: Duration::seconds(config.session_ttl_secs.max(1) as i64),
        }
    }

    pub async fn authenticate(
        &self,
        customer_id: &str,
        credential: &str,
    ) -> Result<AuthenticatedSession, AuthError> {
        let id = CustomerId(customer_id.trim().to_string());
        let customer =
            self.customers.find_by_id(&id).await?.ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        if let Some(locked_until) = customer.locked_until {
            if now < locked_until {
                warn!(event_name = "auth.locked_attempt", customer_id = %id);
                return Err(AuthError::AccountLocked { locked_until });
            }
            // Cooldown elapsed; the stale lock clears on the next outcome.
        }

        if customer.account_status != AccountStatus::Active {
            return Err(AuthError::AccountInactive { status: customer.account_status });
        }

        let stored = self.customers.credential_digest(&id).await?;
        if stored.as_deref() != Some(credential_digest(credential).as_str()) {
            return self.register_failure(&customer, now).await;
        }

        self.customers.record_login_success(&id, now).await?;
        let issued = self.signer.issue(&id.0, self.session_ttl);
        self.sessions.write().await.insert(issued.token.clone(), id.clone());
        info!(event_name = "auth.login", customer_id = %id);

        Ok(AuthenticatedSession {
            token: issued.token,
            customer_id: id,
            customer_name: customer.name,
            expires_at: issued.expires_at,
        })
    }

    async fn register_failure(
        &self,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedSession, AuthError> {
        // A lock that has already expired does not keep counting old failures.
        let prior_lock_expired = customer.locked_until.is_some() && !customer.is_locked(now);
        let failed_attempts =
            if prior_lock_expired { 1 } else { customer.failed_attempts.saturating_add(1) };

        let locked_until = (failed_attempts >= self.lockout_threshold)
            .then(|| now + self.lockout_cooldown);
        self.customers
            .record_login_failure(&customer.id, failed_attempts, locked_until)
            .await?;

        match locked_until {
            Some(locked_until) => {
                warn!(
                    event_name = "auth.lockout",
                    customer_id = %customer.id,
                    failed_attempts,
                );
                Err(AuthError::AccountLocked { locked_until })
            }
            None => {
                warn!(
                    event_name = "auth.bad_credential",
                    customer_id = %customer.id,
                    failed_attempts,
                );
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Resolves a session token to a customer. The token must verify, still
    /// be active (not logged out), and belong to a customer whose account has
    /// not been removed, locked, or deactivated since the session began.
    pub async fn verify_session(&self, token: &str) -> Result<Customer, AuthError> {
        let claims = self.signer.verify(token, Utc::now())?;

        let active = {
            let sessions = self.sessions.read().await;
            sessions.get(token).is_some_and(|id| id.0 == claims.customer_id)
        };
        if !active {
            return Err(AuthError::Session(SessionError::Revoked));
        }

        let id = CustomerId(claims.customer_id);
        let customer =
            self.customers.find_by_id(&id).await?.ok_or(AuthError::InvalidCredentials)?;
        if let Some(locked_until) = customer.locked_until {
            if Utc::now() < locked_until {
                return Err(AuthError::AccountLocked { locked_until });
            }
        }
        if customer.account_status != AccountStatus::Active {
            return Err(AuthError::AccountInactive { status: customer.account_status });
        }
        Ok(customer)
    }

    /// Idempotent; logging out an unknown token is a no-op.
    pub async fn logout(&self, token: &str) {
        if self.sessions.write().await.remove(token).is_some() {
            info!(event_name = "auth.logout");
        }
    }
}
