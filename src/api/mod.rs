pub mod client;
mod error;
pub mod retry;
pub mod session;
mod token;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{QueryResult, SipniClient};
pub use error::{ApiError, ApiResult};
pub use retry::RetryPolicy;
pub use session::{Session, SessionManager};
pub use token::{decode_expiry, Credentials};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
