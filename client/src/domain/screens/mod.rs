//! Screen controllers.
//!
//! Each screen owns its local ordered lists and runs fetch-then-patch cycles
//! against the data gateway: local state changes only after the gateway
//! confirms a write, and every outcome is reported through the
//! [`Notifier`](crate::domain::ports::Notifier) port.

pub mod learn;
pub mod login;
pub mod manage_course;
pub mod manage_users;
pub mod settings;

pub use learn::{LearnScreen, PlayerView};
pub use login::LoginScreen;
pub use manage_course::{CourseModule, ManageCourseScreen};
pub use manage_users::{ManageUsersScreen, NewUser, UserChanges};
pub use settings::{SettingsForm, SettingsScreen};

use std::cmp::Ordering;

use tracing::warn;

use crate::domain::Error;
use crate::domain::ports::{Notification, Notifier};

/// Log `error`, show `message` and hand the error back to the caller.
fn report_failure(notifier: &dyn Notifier, message: &str, error: Error) -> Error {
    warn!(code = ?error.code(), error = %error, "{message}");
    notifier.notify(Notification::error(message));
    error
}

/// Show a validation failure verbatim.
fn reject(notifier: &dyn Notifier, error: Error) -> Error {
    notifier.notify(Notification::error(error.message()));
    error
}

/// Local list order for titles and names.
///
/// Case-insensitive first so patched lists agree with the server's
/// `order=<column>.asc` under a case-insensitive collation; byte order
/// breaks ties.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
