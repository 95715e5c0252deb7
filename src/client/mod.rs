// src/client/mod.rs
//
// Typed HTTP client for the `/api` surface. Owns its session explicitly;
// nothing here is global.

pub mod api;
pub mod error;
pub mod messages;
pub mod retry;
pub mod session;

pub use api::{ApiClient, ClientConfig};
pub use error::ClientError;
pub use messages::friendly_message;
pub use retry::RetryPolicy;
pub use session::{Session, peek_unverified_claims};
