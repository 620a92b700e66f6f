// tecoapi-api: Async Rust client for the TecoApi object service

pub mod client;
pub mod error;
pub mod service;
pub mod transport;

pub use client::TecoClient;
pub use error::Error;
pub use service::Service;
pub use transport::{BasicAuth, Deadline, TlsMode, TransportConfig};
