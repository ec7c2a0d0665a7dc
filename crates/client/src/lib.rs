//! HTTP client for the remote attendance, identity and directory APIs.
//!
//! Every endpoint answers with an `{success, data, message}` envelope which is
//! unwrapped here; callers only ever see typed payloads or a [`ClientError`].

pub mod attendance;
pub mod directory;
pub mod error;
pub mod http;
pub mod identity;
pub mod metrics;
pub mod store;

pub use attendance::SessionGateway;
pub use error::ClientError;
pub use http::{ApiClient, ApiConfig};
pub use store::FileStore;
