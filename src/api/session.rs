//! Authenticated session lifecycle.
//!
//! `SessionManager` exchanges the Basic credential for a bearer token, keeps
//! the token's expiry, re-authenticates when the token has lapsed, and signs
//! resource requests with the current bearer header.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use super::error::{truncate_for_log, ApiError, ApiResult, MAX_LOG_BODY_LENGTH};
use super::retry::RetryPolicy;
use super::token::{decode_expiry, Credentials};
use super::transport::{HttpRequest, HttpResponse, HttpTransport};

const TOKEN_PATH: [&str; 2] = ["autenticacao", "tokenAcesso"];

/// Value of `erro-mensagem` the service uses for rejected credentials.
const AUTHENTICATION_ERROR_MESSAGE: &str = "Authentication";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(rename = "erro-mensagem")]
    message: Option<String>,
}

/// A bearer token together with its decoded expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    expires_at: DateTime<Utc>,
    bearer: String,
}

impl Session {
    fn from_token(access_token: String) -> ApiResult<Self> {
        let expires_at = decode_expiry(&access_token)?;
        let bearer = format!("Bearer {}", access_token);
        Ok(Self {
            access_token,
            expires_at,
            bearer,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> &str {
        &self.bearer
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &format!("<{} chars>", self.access_token.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub struct SessionManager<T: HttpTransport> {
    transport: T,
    basic_authorization: String,
    session: Option<Session>,
    auto_refresh: bool,
    retry: RetryPolicy,
}

impl<T: HttpTransport> SessionManager<T> {
    /// Build a manager without contacting the service.
    pub fn new(transport: T, credentials: &Credentials, auto_refresh: bool, retry: RetryPolicy) -> Self {
        Self {
            transport,
            basic_authorization: format!("Basic {}", credentials.basic_token()),
            session: None,
            auto_refresh,
            retry,
        }
    }

    /// Build a manager and perform the initial token exchange.
    pub fn connect(
        transport: T,
        credentials: &Credentials,
        auto_refresh: bool,
        retry: RetryPolicy,
    ) -> ApiResult<Self> {
        let mut manager = Self::new(transport, credentials, auto_refresh, retry);
        manager.authenticate()?;
        Ok(manager)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Exchange the stored credentials for a new access token.
    ///
    /// The current session is replaced only once the new token has been
    /// received and decoded; on any error the previous session is kept.
    pub fn authenticate(&mut self) -> ApiResult<()> {
        let request = HttpRequest::post(&TOKEN_PATH)
            .header("X-Authorization", self.basic_authorization.clone());
        debug!("POST {} (token exchange)", request.display_path());

        let response = self
            .retry
            .run("token exchange", || self.transport.send(&request))?;

        if !response.is_success() {
            return Err(token_exchange_error(response));
        }

        let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            ApiError::InvalidResponse(format!("token exchange returned no accessToken: {}", e))
        })?;

        let session = Session::from_token(token.access_token)?;
        info!("Authenticated with SI-PNI; token expires at {}", session.expires_at());
        self.session = Some(session);
        Ok(())
    }

    /// Re-authenticate if there is no session or the current token has expired.
    pub fn ensure_fresh_session(&mut self) -> ApiResult<()> {
        match self.session.as_ref().map(|s| (s.is_expired(), s.expires_at())) {
            Some((false, _)) => return Ok(()),
            Some((true, expired_at)) => {
                debug!("Access token expired at {}, re-authenticating", expired_at);
            }
            None => debug!("No session yet, authenticating"),
        }
        self.authenticate()
    }

    /// GET a resource path with the current bearer token and parse the JSON body.
    pub fn authorized_get<S: AsRef<str>>(&mut self, segments: &[S]) -> ApiResult<Value> {
        if self.auto_refresh {
            self.ensure_fresh_session()?;
        }

        let session = self.session.as_ref().ok_or(ApiError::NotAuthenticated)?;
        let request = HttpRequest::get(segments).header("Authorization", session.bearer_header());
        let path = request.display_path();
        debug!("GET {}", path);

        let response = self.retry.run(&path, || self.transport.send(&request))?;

        if !response.is_success() {
            warn!(
                "GET {} failed ({}): {}",
                path,
                response.status,
                truncate_for_log(&response.body, MAX_LOG_BODY_LENGTH)
            );
            return Err(ApiError::UnexpectedResponse {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::InvalidResponse(format!("GET {} returned invalid JSON: {}", path, e)))
    }
}

/// Map a non-2xx token exchange response to the matching error.
fn token_exchange_error(response: HttpResponse) -> ApiError {
    let rejected = serde_json::from_str::<TokenErrorResponse>(&response.body)
        .ok()
        .and_then(|e| e.message)
        .is_some_and(|m| m == AUTHENTICATION_ERROR_MESSAGE);

    debug!(
        "token exchange failed ({}): {}",
        response.status,
        truncate_for_log(&response.body, MAX_LOG_BODY_LENGTH)
    );

    if rejected {
        ApiError::Unauthorized {
            body: response.body,
        }
    } else {
        ApiError::UnexpectedResponse {
            status: response.status,
            body: response.body,
        }
    }
}
