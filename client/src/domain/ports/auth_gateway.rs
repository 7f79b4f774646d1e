//! Driven port for the hosted authentication service.
//!
//! The auth gateway owns credential checks, token issuance and the current
//! session. The domain only observes session changes through a
//! [`SessionSubscription`] and never inspects tokens.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{AccountUpdate, AuthSession, Credentials, Email, Password, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth gateway adapters.
    pub enum AuthGatewayError {
        /// Email/password pair was not accepted.
        InvalidCredentials => "invalid login credentials",
        /// The service refused the request (weak password, duplicate email, ...).
        Rejected { message: String } => "auth request rejected: {message}",
        /// The service could not be reached or timed out.
        Transport { message: String } => "auth service unreachable: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "auth response could not be decoded: {message}",
        /// The operation needs a signed-in session.
        NoSession => "no active session",
    }
}

/// What happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    /// A session was established.
    SignedIn,
    /// The session ended.
    SignedOut,
    /// Tokens were rotated for the same user.
    TokenRefreshed,
    /// The account's email or password changed.
    UserUpdated,
    /// The listener fell behind; the session must be re-read.
    Resync,
}

/// Session-change notification emitted by the auth gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    /// Kind of change.
    pub kind: AuthEventKind,
    /// Session after the change, when one exists.
    pub session: Option<AuthSession>,
}

impl AuthEvent {
    /// Event carrying the new session.
    pub fn signed_in(session: AuthSession) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    /// Event for a cleared session.
    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }
}

/// Receiving end of the gateway's session-change stream.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl SessionSubscription {
    /// Wrap a broadcast receiver.
    pub fn new(receiver: broadcast::Receiver<AuthEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next event; `None` once the gateway is gone.
    ///
    /// Missed events collapse into a single [`AuthEventKind::Resync`].
    pub async fn next(&mut self) -> Option<AuthEvent> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "session subscription lagged");
                Some(AuthEvent {
                    kind: AuthEventKind::Resync,
                    session: None,
                })
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// Port for authentication operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Current session, if any.
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthGatewayError>;

    /// Register a listener for session changes.
    fn subscribe(&self) -> SessionSubscription;

    /// Exchange credentials for a session. Emits [`AuthEventKind::SignedIn`].
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthGatewayError>;

    /// Create a new auth record and return its id.
    ///
    /// The current session is left untouched.
    async fn sign_up(&self, email: &Email, password: &Password)
    -> Result<UserId, AuthGatewayError>;

    /// End the current session. Emits [`AuthEventKind::SignedOut`].
    async fn sign_out(&self) -> Result<(), AuthGatewayError>;

    /// Change the signed-in account's email and/or password.
    async fn update_user(&self, update: &AccountUpdate) -> Result<(), AuthGatewayError>;
}
