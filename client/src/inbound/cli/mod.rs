//! Terminal shell.
//!
//! Each invocation signs in, lets the session settle, applies the route
//! guard to the requested screen and runs one screen action. Output goes to
//! stdout, notifications and failures to stderr.

pub mod args;
mod notifier;
mod render;
mod shell;

pub use args::{Cli, Command, CourseAction, RoleArg, SettingsArgs, StatusArg, UserAction, read_secret};
pub use notifier::TerminalNotifier;
pub use shell::{Gateways, ShellError, run};
