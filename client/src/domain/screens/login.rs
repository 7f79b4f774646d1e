//! Sign-in form.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::session::SessionManager;

/// Email/password form. Failures stay inline; nothing is notified.
#[derive(Default)]
pub struct LoginScreen {
    /// Email field.
    pub email: String,
    /// Password field.
    pub password: Zeroizing<String>,
    error: Option<String>,
    submitting: bool,
}

impl fmt::Debug for LoginScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginScreen")
            .field("email", &self.email)
            .field("error", &self.error)
            .field("submitting", &self.submitting)
            .finish_non_exhaustive()
    }
}

impl LoginScreen {
    /// Form with both fields filled.
    pub fn with_credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
            ..Self::default()
        }
    }

    /// Inline error from the last attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a sign-in request is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Ask the session manager to sign in. Returns `true` on success; the
    /// identity arrives through the session's change stream.
    pub async fn submit(&mut self, session: &SessionManager) -> bool {
        self.submitting = true;
        self.error = None;
        let result = session.sign_in(&self.email, &self.password).await;
        self.submitting = false;
        match result {
            Ok(()) => {
                self.password = Zeroizing::default();
                true
            }
            Err(err) => {
                self.error = Some(err.message().to_owned());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::Role;
    use crate::domain::gateway_errors::INVALID_CREDENTIALS_MESSAGE;
    use crate::test_support::{InMemoryGateway, identity};
    use rstest::{fixture, rstest};

    #[fixture]
    fn gateway() -> Arc<InMemoryGateway> {
        let gateway = InMemoryGateway::new();
        gateway.seed_user(
            &identity(
                "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "Ada",
                "ada@example.com",
                Some(Role::User),
            ),
            "secret",
        );
        Arc::new(gateway)
    }

    #[rstest]
    #[tokio::test]
    async fn wrong_password_sets_inline_error(gateway: Arc<InMemoryGateway>) {
        let session = SessionManager::start(gateway.clone(), gateway.clone());
        let mut screen = LoginScreen::with_credentials("ada@example.com", "nope");

        assert!(!screen.submit(&session).await);

        assert_eq!(screen.error(), Some(INVALID_CREDENTIALS_MESSAGE));
        assert!(!screen.is_submitting());
        session.shutdown().await;
    }

    #[rstest]
    #[tokio::test]
    async fn success_clears_password_and_error(gateway: Arc<InMemoryGateway>) {
        let session = SessionManager::start(gateway.clone(), gateway.clone());
        let mut screen = LoginScreen::with_credentials("ada@example.com", "secret");

        assert!(screen.submit(&session).await);

        assert!(screen.error().is_none());
        assert!(screen.password.is_empty());
        assert!(gateway.session().is_some());
        session.shutdown().await;
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_email_is_reported_inline(gateway: Arc<InMemoryGateway>) {
        let session = SessionManager::start(gateway.clone(), gateway.clone());
        let mut screen = LoginScreen::with_credentials("ada", "secret");

        assert!(!screen.submit(&session).await);

        assert!(screen.error().is_some());
        assert!(gateway.session().is_none());
        session.shutdown().await;
    }
}
