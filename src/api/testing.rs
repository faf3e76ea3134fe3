//! Scripted transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::token::make_token;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Replays queued outcomes in order and records every request it receives.
#[derive(Default)]
pub struct FakeTransport {
    outcomes: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: HttpResponse) -> Self {
        self.outcomes.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.outcomes.borrow_mut().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Number of token exchanges seen so far.
    pub fn token_exchanges(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.display_path() == "/autenticacao/tokenAcesso")
            .count()
    }
}

impl HttpTransport for FakeTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.outcomes.borrow_mut().pop_front().unwrap_or_else(|| {
            panic!("FakeTransport: no scripted outcome for {}", request.display_path())
        })
    }
}

/// Token exchange body carrying a token that expires at `exp`.
pub fn token_body(exp: i64) -> String {
    serde_json::json!({ "accessToken": make_token(exp) }).to_string()
}
