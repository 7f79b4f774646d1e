//! Command-line surface of the `academy` binary.

use std::io::{self, BufRead};

use clap::{Args, Parser, Subcommand, ValueEnum};
use zeroize::Zeroizing;

use crate::domain::{ChapterStatus, Role, Route};

/// `academy` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "academy",
    about = "Browse and manage Zen Academy courses from the terminal",
    version
)]
pub struct Cli {
    /// Login email.
    #[arg(long, value_name = "email")]
    pub email: String,
    /// Login password. Read from stdin when omitted.
    #[arg(long, value_name = "password")]
    pub password: Option<String>,
    /// Screen and action to run once signed in.
    #[command(subcommand)]
    pub command: Command,
}

/// Screens reachable from the shell.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the sidebar for the signed-in user.
    Nav,
    /// Resolve a path against the route guards and print the decision.
    Open {
        /// Path such as `/dashboard/manage-users`.
        path: String,
    },
    /// Browse modules and live chapters.
    Learn {
        /// Module to open instead of the first one.
        #[arg(long, value_name = "id")]
        module: Option<String>,
        /// Chapter to play.
        #[arg(long, value_name = "id")]
        chapter: Option<String>,
    },
    /// Edit modules and chapters (admins only).
    Course {
        /// Action to run; lists the course when omitted.
        #[command(subcommand)]
        action: Option<CourseAction>,
    },
    /// Manage user profiles (admins only).
    Users {
        /// Action to run; lists users when omitted.
        #[command(subcommand)]
        action: Option<UserAction>,
    },
    /// Show or change the signed-in user's profile.
    Settings(SettingsArgs),
}

/// Course editor actions.
#[derive(Debug, Clone, Subcommand)]
pub enum CourseAction {
    /// Add a module.
    AddModule {
        /// Module title.
        #[arg(long)]
        title: String,
    },
    /// Rename a module.
    RenameModule {
        /// Module id.
        #[arg(long)]
        id: String,
        /// New title.
        #[arg(long)]
        title: String,
    },
    /// Delete an empty module.
    DeleteModule {
        /// Module id.
        #[arg(long)]
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Add a chapter to a module.
    AddChapter {
        /// Owning module id.
        #[arg(long)]
        module: String,
        /// Chapter title.
        #[arg(long)]
        title: String,
        /// YouTube link.
        #[arg(long)]
        link: String,
        /// Publication status.
        #[arg(long, value_enum, default_value_t = StatusArg::Draft)]
        status: StatusArg,
    },
    /// Change a chapter; omitted fields keep their current value.
    EditChapter {
        /// Chapter id.
        #[arg(long)]
        id: String,
        /// Move to another module.
        #[arg(long)]
        module: Option<String>,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New YouTube link.
        #[arg(long)]
        link: Option<String>,
        /// New status.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Delete a chapter.
    DeleteChapter {
        /// Chapter id.
        #[arg(long)]
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// User management actions.
#[derive(Debug, Clone, Subcommand)]
pub enum UserAction {
    /// Create an auth record and its profile row.
    Create {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Login email.
        #[arg(long)]
        email: String,
        /// Initial password.
        #[arg(long)]
        password: String,
        /// Role.
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    /// Change a listed user; omitted fields keep their current value.
    Update {
        /// User id.
        #[arg(long)]
        id: String,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Contact email.
        #[arg(long)]
        email: Option<String>,
        /// Role.
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
        /// New password; only accepted for your own account.
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user's profile row.
    Delete {
        /// User id.
        #[arg(long)]
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Profile fields to change. Nothing given means "show".
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// New display name.
    #[arg(long)]
    pub name: Option<String>,
    /// New email.
    #[arg(long)]
    pub email: Option<String>,
    /// New password.
    #[arg(long = "new-password")]
    pub password: Option<String>,
    /// Repeat of the new password.
    #[arg(long = "confirm-password")]
    pub confirm_password: Option<String>,
}

impl SettingsArgs {
    /// True when no field was given.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.confirm_password.is_none()
    }
}

/// `--role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Administrator.
    Admin,
    /// Learner.
    User,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => Self::Admin,
            RoleArg::User => Self::User,
        }
    }
}

/// `--status` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Hidden from learners.
    Draft,
    /// Visible to learners.
    Live,
}

impl From<StatusArg> for ChapterStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => Self::Draft,
            StatusArg::Live => Self::Live,
        }
    }
}

impl Command {
    /// Screen path the command runs on.
    pub fn path(&self) -> String {
        match self {
            Self::Open { path } => path.clone(),
            Self::Nav | Self::Learn { .. } => Route::Learn.path().to_owned(),
            Self::Course { .. } => Route::ManageCourse.path().to_owned(),
            Self::Users { .. } => Route::ManageUsers.path().to_owned(),
            Self::Settings(_) => Route::Settings.path().to_owned(),
        }
    }

    /// Name of the destructive action that still lacks `--yes`.
    pub fn unconfirmed(&self) -> Option<&'static str> {
        match self {
            Self::Course {
                action: Some(CourseAction::DeleteModule { yes: false, .. }),
            } => Some("course delete-module"),
            Self::Course {
                action: Some(CourseAction::DeleteChapter { yes: false, .. }),
            } => Some("course delete-chapter"),
            Self::Users {
                action: Some(UserAction::Delete { yes: false, .. }),
            } => Some("users delete"),
            _ => None,
        }
    }
}

/// Read one line from `reader` without its line terminator.
///
/// # Errors
///
/// Returns an error when reading fails or the input is empty.
pub fn read_secret(mut reader: impl BufRead) -> io::Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    reader.read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no password on stdin",
        ));
    }
    Ok(Zeroizing::new(trimmed.to_owned()))
}
