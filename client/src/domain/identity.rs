//! Identity data model: the signed-in user's profile row.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by identity value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    EmptyId,
    InvalidId,
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
    EmptyEmail,
    InvalidEmail,
    UnknownRole { value: String },
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyDisplayName => write!(f, "name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "name must be at most {max} characters")
            }
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like name@example.com"),
            Self::UnknownRole { value } => {
                write!(f, "role must be \"admin\" or \"user\", got \"{value}\"")
            }
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Stable user identifier issued by the auth service, stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, IdentityValidationError> {
        if id.is_empty() {
            return Err(IdentityValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(IdentityValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| IdentityValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 120;

/// Human readable name shown in the sidebar greeting and the users table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is
    /// dropped.
    pub fn new(display_name: impl Into<String>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, IdentityValidationError> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(IdentityValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only; the auth service owns deliverability.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address used both as the login name and the profile contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, IdentityValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, IdentityValidationError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyEmail);
        }
        if !email_regex().is_match(trimmed) {
            return Err(IdentityValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Binary role stored on the `users` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can manage users, modules and chapters.
    Admin,
    /// Learner.
    User,
}

impl Role {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Parse the wire representation, returning `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = IdentityValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| IdentityValidationError::UnknownRole {
            value: s.to_owned(),
        })
    }
}

/// Profile record of an authenticated user.
///
/// ## Invariants
/// - `id` matches the auth service's subject id for the user's session.
/// - `role` is `None` when the stored role is missing or unrecognised; such
///   identities are treated as non-admin everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentityRow", into = "IdentityRow")]
pub struct Identity {
    id: UserId,
    name: DisplayName,
    email: Email,
    role: Option<Role>,
}

impl Identity {
    /// Build a new [`Identity`] from validated components.
    pub fn new(id: UserId, name: DisplayName, email: Email, role: Option<Role>) -> Self {
        Self {
            id,
            name,
            email,
            role,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Email address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Stored role, if recognised.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// True iff the role is [`Role::Admin`].
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    /// Capability required to open admin-only screens.
    pub fn admin_access(&self) -> Option<AdminAccess> {
        self.is_admin().then(|| AdminAccess {
            admin_id: self.id.clone(),
        })
    }

    /// Copy of this identity with profile fields replaced.
    #[must_use]
    pub fn with_profile(&self, name: DisplayName, email: Email, role: Option<Role>) -> Self {
        Self::new(self.id.clone(), name, email, role)
    }
}

/// Proof that the holder was handed an identity whose role is admin.
///
/// There is no public constructor: the only source is
/// [`Identity::admin_access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccess {
    admin_id: UserId,
}

impl AdminAccess {
    /// Id of the admin this capability was issued to.
    pub fn admin_id(&self) -> &UserId {
        &self.admin_id
    }
}

/// Row shape of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityRow {
    id: String,
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

impl From<Identity> for IdentityRow {
    fn from(value: Identity) -> Self {
        let Identity {
            id,
            name,
            email,
            role,
        } = value;
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: role.map(|role| role.as_str().to_owned()),
        }
    }
}

impl TryFrom<IdentityRow> for Identity {
    type Error = IdentityValidationError;

    fn try_from(value: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Self::new(
            UserId::new(value.id)?,
            DisplayName::new(value.name)?,
            Email::new(value.email)?,
            value.role.as_deref().and_then(Role::parse),
        ))
    }
}

#[cfg(test)]
mod tests;
