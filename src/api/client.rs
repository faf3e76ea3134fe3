use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::session::{Session, SessionManager};
use super::token::Credentials;
use super::transport::{is_routable_segment, HttpTransport, ReqwestTransport};
use crate::config::ClientConfig;

/// Personal and vaccination-calendar records for one citizen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    #[serde(skip)]
    pub document: String,
    pub personal: Value,
    pub calendar: Value,
}

/// Client for the SI-PNI citizen lookup endpoints.
pub struct SipniClient<T: HttpTransport = ReqwestTransport> {
    session: SessionManager<T>,
}

impl SipniClient<ReqwestTransport> {
    /// Connect to the production service with auto-refresh enabled.
    pub fn new(login: &str, password: &str) -> ApiResult<Self> {
        Self::with_config(&Credentials::new(login, password), ClientConfig::default())
    }

    pub fn with_config(credentials: &Credentials, config: ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(&config.base_url, config.timeout, &config.user_agent)?;
        Self::with_transport(transport, credentials, config)
    }
}

impl<T: HttpTransport> SipniClient<T> {
    /// Build a client on an arbitrary transport. Authenticates before returning.
    pub fn with_transport(transport: T, credentials: &Credentials, config: ClientConfig) -> ApiResult<Self> {
        debug!("Connecting to SI-PNI as {}", credentials.login());
        let session = SessionManager::connect(transport, credentials, config.auto_refresh, config.retry)?;
        Ok(Self { session })
    }

    /// Fetch the personal record, then the calendar record, for `document`.
    ///
    /// The calendar request is only sent once the personal one has succeeded.
    /// Identifiers that would not survive as a single path segment (empty,
    /// `.` or `..`) fail with `InvalidIdentifier` before anything is sent.
    pub fn query(&mut self, document: &str) -> ApiResult<QueryResult> {
        if !is_routable_segment(document) {
            return Err(ApiError::InvalidIdentifier(document.to_string()));
        }

        let personal = self.session.authorized_get(&["cidadao", "cpf", document])?;
        let calendar = self.session.authorized_get(&["calendario", "cpf", document])?;

        Ok(QueryResult {
            document: document.to_string(),
            personal,
            calendar,
        })
    }

    /// Force a new token exchange.
    pub fn authenticate(&mut self) -> ApiResult<()> {
        self.session.authenticate()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.session()
    }

    pub fn auto_refresh(&self) -> bool {
        self.session.auto_refresh()
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.session.set_auto_refresh(enabled);
    }

    pub fn transport(&self) -> &T {
        self.session.transport()
    }
}
