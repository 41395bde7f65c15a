/// REST backend access
///
/// - `client.rs` - the single configured HTTP client and every endpoint
/// - `csrf.rs` - CSRF cookie lookup for unsafe methods
/// - `error.rs` - error type carried back into the UI

pub mod client;
pub mod csrf;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
