//! Learning-management client library.
//!
//! The domain (session state, routing and screens) talks to the hosted
//! backend only through the ports in [`domain::ports`]. [`outbound`] holds the
//! HTTP adapters and [`inbound`] the terminal shell.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigError, GatewaySettings};
