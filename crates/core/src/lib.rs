//! `ledgerlens-core` — shared building blocks.
//!
//! This crate holds the failure taxonomy every layer reports into and the
//! identifiers that scope a request to a tenant and a caller. It has no
//! network or runtime concerns.

pub mod error;
pub mod id;

pub use error::{ErrorKind, Failure};
pub use id::{TenantId, UserId};
