#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod ack;
pub mod config;
pub mod events;
pub mod pipeline;
pub mod processors;
pub mod routing;
pub mod tagging;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
