//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`).
//!
//! Compiled for `cfg(test)` and for the `test-support` feature.

mod clock;
mod gateway;
mod notifier;

pub use clock::FixedClock;
pub use gateway::{GatewayCall, InMemoryGateway, Operation};
pub use notifier::RecordingNotifier;

use crate::domain::{DisplayName, Email, Identity, Role, UserId};

/// Build an identity from raw parts, panicking on invalid input.
pub fn identity(id: &str, name: &str, email: &str, role: Option<Role>) -> Identity {
    let parts = (UserId::new(id), DisplayName::new(name), Email::new(email));
    match parts {
        (Ok(id), Ok(name), Ok(email)) => Identity::new(id, name, email, role),
        other => panic!("fixture identity must be valid: {other:?}"),
    }
}
