// convergent-api: Async Rust client for remote configuration services
// whose mutations are accepted synchronously and applied asynchronously.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::GatewayClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
