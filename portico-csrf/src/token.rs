use crate::error::{CsrfError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Binding used when the visitor has no session.
pub const ANONYMOUS: &str = "anonymous";

/// CSRF token with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    /// Random value that forms must echo back
    pub value: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Session the token was issued for
    pub session_id: String,
}

impl CsrfToken {
    /// Generate a new token bound to `session_id`
    pub fn generate(ttl_seconds: i64, session_id: impl Into<String>) -> Self {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.r#gen();
        let value = URL_SAFE_NO_PAD.encode(random_bytes);

        let created_at = Utc::now();
        let expires_at = created_at + Duration::seconds(ttl_seconds);

        Self {
            value,
            created_at,
            expires_at,
            session_id: session_id.into(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_bound_to(&self, session_id: &str) -> bool {
        constant_time_compare(&self.session_id, session_id)
    }

    /// True when `submitted` equals this token's value. Constant time.
    pub fn matches(&self, submitted: &str) -> bool {
        constant_time_compare(&self.value, submitted)
    }

    /// Encode token to signed string
    pub fn encode(&self, secret: &[u8]) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let signature = Self::sign(&json, secret)?;
        let encoded = format!("{}.{}", json, signature);
        Ok(URL_SAFE_NO_PAD.encode(encoded))
    }

    /// Decode and verify signed token
    pub fn decode(encoded: &str, secret: &[u8]) -> Result<Self> {
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CsrfError::ValidationFailed(e.to_string()))?;

        let decoded_str =
            String::from_utf8(decoded).map_err(|e| CsrfError::ValidationFailed(e.to_string()))?;

        // The signature is base64url and never contains a dot; the JSON may.
        let (json, signature) = decoded_str
            .rsplit_once('.')
            .ok_or(CsrfError::InvalidToken)?;

        let expected_signature = Self::sign(json, secret)?;
        if !constant_time_compare(signature, &expected_signature) {
            return Err(CsrfError::InvalidToken);
        }

        let token: CsrfToken = serde_json::from_str(json)?;
        if token.is_expired() {
            return Err(CsrfError::TokenExpired);
        }

        Ok(token)
    }

    /// Sign data with HMAC-SHA256
    fn sign(data: &str, secret: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| CsrfError::Config(e.to_string()))?;
        mac.update(data.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

/// Compare two strings without short-circuiting on the first difference
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
