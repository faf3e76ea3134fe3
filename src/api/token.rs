//! Credential encoding and access-token claim decoding.
//!
//! The service issues JWT-shaped tokens. Only the `exp` claim is read; the
//! signature is not verified since the token comes straight from the
//! service it is sent back to.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};

/// URL-safe decoder that accepts payloads with or without `=` padding.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Login and password for the token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// `base64(login:password)`, the value sent after `Basic `.
    pub fn basic_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.login, self.password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: f64,
}

/// Read the `exp` claim from a three-part, dot-delimited access token.
pub fn decode_expiry(token: &str) -> ApiResult<DateTime<Utc>> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(ApiError::InvalidToken(
                "expected three dot-separated segments".to_string(),
            ));
        }
    };

    // Accept the standard alphabet too; some issuers don't use the URL-safe one
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = CLAIMS_ENGINE
        .decode(normalized.as_bytes())
        .map_err(|e| ApiError::InvalidToken(format!("payload is not base64: {}", e)))?;

    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidToken(format!("payload has no usable exp claim: {}", e)))?;

    if !claims.exp.is_finite() {
        return Err(ApiError::InvalidToken("exp claim is not finite".to_string()));
    }

    // keep sub-second precision so a token is not treated as expired early
    DateTime::from_timestamp_millis((claims.exp * 1000.0).floor() as i64)
        .ok_or_else(|| ApiError::InvalidToken(format!("exp claim {} is out of range", claims.exp)))
}

#[cfg(test)]
pub(crate) fn make_token(exp: i64) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS512","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"tester","exp":{}}}"#, exp));
    format!("{}.{}.signature", header, payload)
}
