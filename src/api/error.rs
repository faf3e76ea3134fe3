use thiserror::Error;

/// Maximum length for response bodies in log output.
pub(crate) const MAX_LOG_BODY_LENGTH: usize = 500;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication rejected by SI-PNI. Check SIPNI_LOGIN and SIPNI_PASSWORD. Response: {body}")]
    Unauthorized { body: String },

    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Request timed out after {attempts} attempt(s): {message}")]
    Timeout { attempts: u32, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("No session available and auto-refresh is disabled. Call authenticate() first.")]
    NotAuthenticated,

    #[error("Client configuration error: {0}")]
    Config(String),

    #[error("Invalid citizen identifier {0:?}: it cannot be sent as a URL path segment")]
    InvalidIdentifier(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Slice a string to at most `max_len` bytes without splitting a UTF-8 character.
fn safe_prefix(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate a string for log output, appending "..." if truncated.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", safe_prefix(s, max_len))
    }
}
