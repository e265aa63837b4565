//! Signed cookie codec.
//!
//! A cookie value is `base64url(json(payload)) "." base64url(mac)` where
//! `mac = HMAC-SHA256(key, name "|" encoded_payload)`. The payload is signed,
//! not encrypted; it only ever carries the session id.

use crate::error::CookieError;
use crate::traits::SESSION_LIFETIME;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing key length in bytes.
pub const MIN_KEY_LEN: usize = 32;

const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Clone)]
pub struct SignedCookie {
    name: String,
    keyed: HmacSha256,
    max_age: Duration,
    secure: bool,
}

impl std::fmt::Debug for SignedCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookie")
            .field("name", &self.name)
            .field("max_age", &self.max_age)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SignedCookie {
    pub fn new(name: impl Into<String>, key: Vec<u8>) -> Result<Self, CookieError> {
        if key.len() < MIN_KEY_LEN {
            return Err(CookieError::KeyTooShort(MIN_KEY_LEN));
        }
        let keyed =
            HmacSha256::new_from_slice(&key).map_err(|_| CookieError::KeyTooShort(MIN_KEY_LEN))?;
        Ok(Self {
            name: name.into(),
            keyed,
            max_age: Duration::seconds(SESSION_LIFETIME.as_secs() as i64),
            secure: true,
        })
    }

    /// Drop the `Secure` attribute, for plain-HTTP development setups.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn mac(&self, encoded_payload: &str) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(self.name.as_bytes());
        mac.update(b"|");
        mac.update(encoded_payload.as_bytes());
        mac
    }

    pub fn encode(&self, values: &BTreeMap<String, String>) -> Result<String, CookieError> {
        let json =
            serde_json::to_vec(values).map_err(|e| CookieError::Payload(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload).finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify and decode a cookie value. The signature is checked in
    /// constant time before the payload is parsed.
    pub fn decode(&self, value: &str) -> Result<BTreeMap<String, String>, CookieError> {
        let (payload, signature) = value.split_once('.').ok_or(CookieError::Format)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CookieError::Signature)?;
        self.mac(payload)
            .verify_slice(&signature)
            .map_err(|_| CookieError::Signature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| CookieError::Payload(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| CookieError::Payload(e.to_string()))
    }

    /// `Set-Cookie` value carrying `values`, valid for the session lifetime.
    pub fn set_cookie(
        &self,
        values: &BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<String, CookieError> {
        let encoded = self.encode(values)?;
        let expires = (now + self.max_age).format(COOKIE_DATE_FORMAT);
        let mut cookie = format!(
            "{}={}; Path=/; Expires={}; Max-Age={}; HttpOnly; SameSite=Lax",
            self.name,
            encoded,
            expires,
            self.max_age.num_seconds()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        Ok(cookie)
    }

    /// `Set-Cookie` value that makes the browser drop the cookie.
    pub fn removal_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly; SameSite=Lax",
            self.name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Cookie payload naming one session.
    pub fn session_payload(session_id: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("id".to_string(), session_id.to_string())])
    }
}
