//! Client for the SI-PNI (Programa Nacional de Imunizações) citizen lookup API.
//!
//! [`SipniClient`] authenticates with a login/password pair, keeps the bearer
//! token fresh, and merges the personal and vaccination-calendar records for
//! a CPF into one [`QueryResult`].
//!
//! ```no_run
//! let mut client = sipni::SipniClient::new("login", "password")?;
//! let result = client.query("03709375975")?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod config;

pub use api::{ApiError, ApiResult, Credentials, QueryResult, RetryPolicy, SipniClient};
pub use config::ClientConfig;
