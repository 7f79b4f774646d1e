//! Wire shapes for the GoTrue and PostgREST APIs.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountUpdate, AuthSession, Credentials, Email, Password, UserId};

/// Body for the password grant and the sign-up endpoint.
#[derive(Serialize)]
pub(super) struct PasswordBodyDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

impl<'a> PasswordBodyDto<'a> {
    pub(super) fn from_credentials(credentials: &'a Credentials) -> Self {
        Self::new(credentials.email(), credentials.password())
    }

    pub(super) fn new(email: &'a Email, password: &'a Password) -> Self {
        Self {
            email: email.as_ref(),
            password: password.expose(),
        }
    }
}

/// Body for `PUT /auth/v1/user`.
#[derive(Serialize)]
pub(super) struct UserUpdateDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) password: Option<&'a str>,
}

impl<'a> From<&'a AccountUpdate> for UserUpdateDto<'a> {
    fn from(update: &'a AccountUpdate) -> Self {
        Self {
            email: update.email.as_ref().map(AsRef::<str>::as_ref),
            password: update.password.as_ref().map(Password::expose),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: String,
}

/// Password-grant response.
#[derive(Deserialize)]
pub(super) struct TokenResponseDto {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserDto,
}

impl TokenResponseDto {
    pub(super) fn into_session(self) -> Result<AuthSession, String> {
        let user_id = UserId::new(&self.user.id)
            .map_err(|err| format!("session user id {:?}: {err}", self.user.id))?;
        let session = AuthSession::new(user_id, self.access_token);
        Ok(match self.refresh_token {
            Some(token) => session.with_refresh_token(token),
            None => session,
        })
    }
}

/// Sign-up response. With email confirmation enabled the body is the user
/// itself; otherwise it is a session wrapping the user.
#[derive(Debug, Deserialize)]
pub(super) struct SignUpResponseDto {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user: Option<UserDto>,
}

impl SignUpResponseDto {
    pub(super) fn into_user_id(self) -> Result<UserId, String> {
        let raw = self
            .user
            .map(|user| user.id)
            .or(self.id)
            .ok_or_else(|| "sign-up response carries no user id".to_owned())?;
        UserId::new(&raw).map_err(|err| format!("sign-up user id {raw:?}: {err}"))
    }
}

/// Error bodies from either service. GoTrue uses `msg`, `error` and
/// `error_description`; PostgREST uses `message`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub(super) fn message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }

    /// True for a rejected email/password pair.
    pub(super) fn is_invalid_grant(&self) -> bool {
        self.error.as_deref() == Some("invalid_grant")
            || self.error_code.as_deref() == Some("invalid_credentials")
    }
}
