//! Domain primitives, ports and services.
//!
//! Purpose: define the strongly typed values the client works with, the
//! session/role state, the route guard and the screen controllers. Nothing
//! in here knows about HTTP; gateways are reached through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport agnostic failure payload.
//! - Identity (alias to `identity::Identity`): signed-in user's profile row.
//! - Module, Chapter (aliases into `course`): course content.
//! - SessionManager (alias to `session::SessionManager`): current identity.

pub mod auth;
pub mod course;
pub mod error;
mod gateway_errors;
pub mod identity;
pub mod ports;
pub mod routing;
pub mod screens;
pub mod session;

pub use self::auth::{
    AccountUpdate, AuthSession, Credentials, CredentialsValidationError, PASSWORD_MIN_LEN,
    Password,
};
pub use self::course::{
    Chapter, ChapterDraft, ChapterId, ChapterStatus, ChapterTitle, CourseValidationError, Module,
    ModuleId, ModuleTitle, VideoLink,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::gateway_errors::INVALID_CREDENTIALS_MESSAGE;
pub use self::identity::{
    AdminAccess, DisplayName, Email, Identity, IdentityValidationError, Role, UserId,
};
pub use self::routing::{Navigation, Route};
pub use self::session::{SessionManager, SessionState};
