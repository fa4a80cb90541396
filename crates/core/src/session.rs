//! Signed session tokens.
//!
//! Tokens are self-describing: `v1.<customer_id>.<expires_unix>.<nonce>.<sig>`
//! where `sig` is HMAC-SHA256 over the preceding segments. Verification never
//! repairs a token — expired or tampered tokens are rejected outright.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token is malformed")]
    Malformed,
    #[error("session token signature does not verify")]
    BadSignature,
    #[error("session token has expired")]
    Expired,
    #[error("session token has been revoked")]
    Revoked,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionClaims {
    pub customer_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionSigner {
    secret: SecretString,
}

impl SessionSigner {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn issue(&self, customer_id: &str, ttl: Duration) -> IssuedToken {
        // The token encodes whole seconds, so the reported expiry is truncated
        // to match exactly what verification will reconstruct.
        let expires_at = truncate_to_second(Utc::now() + ttl);
        let nonce = format!("{:016x}", rand::random::<u64>());
        let payload =
            format!("{TOKEN_VERSION}.{customer_id}.{}.{nonce}", expires_at.timestamp());
        let signature = hmac_hex(self.secret.expose_secret().as_bytes(), payload.as_bytes());
        IssuedToken { token: format!("{payload}.{signature}"), expires_at }
    }

    /// Signature is checked before expiry so a tampered expiry cannot extend
    /// a token's life; either failure rejects the token.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let segments: Vec<&str> = token.split('.').collect();
        let &[version, customer_id, expires_raw, nonce, signature] = segments.as_slice() else {
            return Err(SessionError::Malformed);
        };
        if version != TOKEN_VERSION || customer_id.is_empty() {
            return Err(SessionError::Malformed);
        }
        let expires_unix: i64 = expires_raw.parse().map_err(|_| SessionError::Malformed)?;

        let payload = format!("{version}.{customer_id}.{expires_raw}.{nonce}");
        let expected = hmac_hex(self.secret.expose_secret().as_bytes(), payload.as_bytes());
        if expected != signature {
            return Err(SessionError::BadSignature);
        }

        let expires_at = Utc
            .timestamp_opt(expires_unix, 0)
            .single()
            .ok_or(SessionError::Malformed)?;
        if now >= expires_at {
            return Err(SessionError::Expired);
        }

        Ok(SessionClaims { customer_id: customer_id.to_string(), expires_at })
    }
}

/// SHA-256 hex digest of a login credential, as stored in the customer table.
pub fn credential_digest(credential: &str) -> String {
    encode_hex(Sha256::digest(credential.as_bytes()).as_slice())
}

fn truncate_to_second(at: DateTime<Utc>) -> DateTime<Utc> {
    at - Duration::nanoseconds(i64::from(at.timestamp_subsec_nanos()))
}

fn hmac_hex(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return encode_hex(Sha256::digest(payload).as_slice()),
    };
    mac.update(payload);
    encode_hex(mac.finalize().into_bytes().as_slice())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut rendered = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        rendered.push_str(&format!("{byte:02x}"));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{credential_digest, SessionError, SessionSigner};

    fn signer() -> SessionSigner {
        SessionSigner::new("a-test-signing-secret-of-decent-length".to_string().into())
    }

    #[test]
    fn issued_token_verifies_and_carries_customer_id() {
        let signer = signer();
        let issued = signer.issue("CUST001", Duration::hours(24));

        let claims = signer.verify(&issued.token, Utc::now()).expect("token should verify");
        assert_eq!(claims.customer_id, "CUST001");
        assert_eq!(claims.expires_at, issued.expires_at);
    }

    #[test]
    fn reported_expiry_matches_the_encoded_second() {
        let signer = signer();
        let issued = signer.issue("CUST001", Duration::hours(1));

        assert_eq!(issued.expires_at.timestamp_subsec_nanos(), 0);
        let claims = signer.verify(&issued.token, Utc::now()).expect("token should verify");
        assert_eq!(claims.expires_at, issued.expires_at);
    }

    #[test]
    fn expired_token_is_rejected_even_with_valid_signature() {
        let signer = signer();
        let issued = signer.issue("CUST001", Duration::seconds(0));

        let result = signer.verify(&issued.token, Utc::now() + Duration::seconds(1));
        assert_eq!(result, Err(SessionError::Expired));
    }

    #[test]
    fn tampered_customer_id_breaks_the_signature() {
        let signer = signer();
        let issued = signer.issue("CUST001", Duration::hours(1));
        let tampered = issued.token.replacen("CUST001", "CUST003", 1);

        assert_eq!(signer.verify(&tampered, Utc::now()), Err(SessionError::BadSignature));
    }

    #[test]
    fn token_signed_with_a_different_secret_is_rejected() {
        let other = SessionSigner::new("another-secret-entirely-here".to_string().into());
        let issued = other.issue("CUST001", Duration::hours(1));

        assert_eq!(signer().verify(&issued.token, Utc::now()), Err(SessionError::BadSignature));
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        let signer = signer();
        assert_eq!(signer.verify("", Utc::now()), Err(SessionError::Malformed));
        assert_eq!(signer.verify("not-a-token", Utc::now()), Err(SessionError::Malformed));
        assert_eq!(
            signer.verify("v1.CUST001.not-a-number.aa.bb", Utc::now()),
            Err(SessionError::Malformed)
        );
    }

    #[test]
    fn credential_digest_is_stable_hex() {
        let digest = credential_digest("sunrise-001");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, credential_digest("sunrise-001"));
        assert_ne!(digest, credential_digest("sunrise-002"));
    }
}
