//! Shared types for the shoptag service: webhook signatures, payload
//! objects and, behind the `client` feature, the Admin API client.

pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
