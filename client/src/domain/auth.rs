//! Authentication primitives: credentials, passwords and gateway sessions.
//!
//! Keep form parsing outside the domain by exposing constructors that
//! validate string inputs before a screen talks to a port.

use std::fmt;

use zeroize::Zeroizing;

use super::identity::{Email, IdentityValidationError, UserId};

/// Minimum password length accepted when creating or changing a password.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was blank or malformed.
    Email(IdentityValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LEN`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(inner) => inner.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Secret password held in zeroising storage.
///
/// Whitespace is kept as typed. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password (used for sign-in).
    pub fn new(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a password for a new account or a password change.
    pub fn new_for_account(raw: &str) -> Result<Self, CredentialsValidationError> {
        let password = Self::new(raw)?;
        if raw.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        Ok(password)
    }

    /// Expose the secret for transmission.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Validated sign-in credentials.
///
/// # Examples
/// ```
/// use academy_client::domain::Credentials;
///
/// let creds = Credentials::try_from_parts(" ada@example.com ", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password().expose(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    email: Email,
    password: Password,
}

impl Credentials {
    /// Construct credentials from raw form inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(CredentialsValidationError::Email)?;
        let password = Password::new(password)?;
        Ok(Self { email, password })
    }

    /// Login email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Login password.
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Proof of authentication issued by the auth gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    user_id: UserId,
    access_token: Zeroizing<String>,
    refresh_token: Option<Zeroizing<String>>,
}

impl AuthSession {
    /// Build a session for `user_id`.
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: Zeroizing::new(access_token.into()),
            refresh_token: None,
        }
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(Zeroizing::new(token.into()));
        self
    }

    /// Session subject.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Bearer token for data requests.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Refresh token, when the gateway issued one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Changes to the signed-in account's auth record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    /// New login email.
    pub email: Option<Email>,
    /// New password.
    pub password: Option<Password>,
}

impl AccountUpdate {
    /// Update only the email.
    pub fn email(email: Email) -> Self {
        Self {
            email: Some(email),
            password: None,
        }
    }

    /// Update only the password.
    pub fn password(password: Password) -> Self {
        Self {
            email: None,
            password: Some(password),
        }
    }

    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}
