// bcfsync-api: Async Rust client for the BCF controller network service,
// speaking its hash-based optimistic-concurrency protocol.

pub mod client;
pub mod cluster;
pub mod error;
pub mod model;
pub mod network;
pub mod router;
pub mod session;
pub mod transport;

pub use client::{BcfClient, HASH_MATCH_HEADER, INSTANCE_ID_HEADER};
pub use error::Error;
pub use session::{EndpointConfig, HashToken, Scheme, SessionState};
pub use transport::{TlsMode, TransportConfig};
