//! Client configuration and environment loading.
//!
//! Credentials come from `SIPNI_LOGIN` / `SIPNI_PASSWORD`. `SIPNI_BASE_URL`
//! and `SIPNI_TIMEOUT_SECS` optionally override the defaults.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::debug;

use crate::api::{Credentials, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://servicos-cloud.saude.gov.br/pni-bff/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (U; Windows i576 x86_64; pt-BR) Gecko/20100101 Firefox/51.5";

pub const LOGIN_VAR: &str = "SIPNI_LOGIN";
pub const PASSWORD_VAR: &str = "SIPNI_PASSWORD";
pub const BASE_URL_VAR: &str = "SIPNI_BASE_URL";
pub const TIMEOUT_VAR: &str = "SIPNI_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service prefix every endpoint path is appended to
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Re-authenticate before a request when the token has expired
    pub auto_refresh: bool,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            auto_refresh: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults with `SIPNI_BASE_URL` and `SIPNI_TIMEOUT_SECS` applied.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_overrides(
            env::var(BASE_URL_VAR).ok().as_deref(),
            env::var(TIMEOUT_VAR).ok().as_deref(),
        )
    }

    fn apply_overrides(mut self, base_url: Option<&str>, timeout_secs: Option<&str>) -> Result<Self> {
        if let Some(url) = base_url.map(str::trim).filter(|u| !u.is_empty()) {
            debug!("Using base URL override {}", url);
            self.base_url = url.to_string();
        }
        if let Some(raw) = timeout_secs.map(str::trim).filter(|t| !t.is_empty()) {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_VAR, raw))?;
            if secs == 0 {
                bail!("{} must be greater than zero", TIMEOUT_VAR);
            }
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Read `SIPNI_LOGIN` and `SIPNI_PASSWORD` from the environment.
pub fn credentials_from_env() -> Result<Credentials> {
    credentials_from(env::var(LOGIN_VAR).ok(), env::var(PASSWORD_VAR).ok())
}

fn credentials_from(login: Option<String>, password: Option<String>) -> Result<Credentials> {
    let login = login
        .filter(|l| !l.is_empty())
        .with_context(|| format!("{} is not set", LOGIN_VAR))?;
    let password = password
        .filter(|p| !p.is_empty())
        .with_context(|| format!("{} is not set", PASSWORD_VAR))?;
    Ok(Credentials::new(login, password))
}
