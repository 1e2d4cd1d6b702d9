//! HTTP access to the HR attendance portal.
//!
//! [`client`] is the transport layer (identity headers, retry, JSON);
//! [`portal`] maps the three portal endpoints onto it and owns the session
//! profile. The [`Portal`] trait is the seam the scheduler drives; tests
//! substitute mock implementations.

pub mod client;
pub mod portal;

pub use client::{DEFAULT_RETRIES, Identity, RestClient, retry_delay};
pub use portal::{Portal, PortalClient};
