//! `ledgerlens-rpc` — resilient JSON-RPC access to the remote ERP.
//!
//! **Responsibility:** one authenticated session per credential set, transient
//! failure retry, and classification of every fault into a stable
//! [`ErrorKind`](ledgerlens_core::ErrorKind).
//!
//! ## Components
//!
//! - [`Transport`]: how bytes reach the server ([`HttpTransport`] in production,
//!   [`InMemoryTransport`] for tests/dev)
//! - [`RpcClient`]: auth caching, retries, search/aggregate primitives
//! - [`GroupedTotals`]: limited group lists paired with unlimited grand totals
//! - [`SchemaCache`]: injected TTL cache for schema introspection

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod health;
pub mod protocol;
pub mod retry;
pub mod schema_cache;
pub mod totals;
pub mod transport;

pub use client::RpcClient;
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::RpcError;
pub use health::HealthReport;
pub use protocol::RemoteFault;
pub use retry::{BackoffStrategy, RetryPolicy};
pub use schema_cache::SchemaCache;
pub use totals::{GrandTotal, GroupedTotals};
pub use transport::{
    HttpTransport, InMemoryTransport, RecordedRequest, Transport, TransportError, TransportResponse,
};
