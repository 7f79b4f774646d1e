//! Account settings for the signed-in user.

use std::fmt;
use std::sync::Arc;

use chrono::SecondsFormat;
use mockable::Clock;
use serde_json::Value;
use tracing::info;
use zeroize::Zeroizing;

use super::{reject, report_failure};
use crate::domain::gateway_errors::{map_auth_error, map_data_error};
use crate::domain::ports::{AuthGateway, DataGateway, Filter, Notification, Notifier, Record, Table};
use crate::domain::session::SessionManager;
use crate::domain::{AccountUpdate, DisplayName, Email, Error, Identity, Password};

/// Notification when the two password fields differ.
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
/// Notification when any step of the save fails.
pub const UPDATE_PROFILE_FAILED: &str = "Failed to update profile";

/// Editable form values. Password fields are wiped on drop.
#[derive(Clone, Default)]
pub struct SettingsForm {
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// New password; empty keeps the current one.
    pub password: Zeroizing<String>,
    /// Must repeat `password`.
    pub confirm_password: Zeroizing<String>,
}

impl fmt::Debug for SettingsForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_set", &!self.password.is_empty())
            .finish_non_exhaustive()
    }
}

impl SettingsForm {
    fn prefilled(identity: &Identity) -> Self {
        Self {
            name: identity.name().to_string(),
            email: identity.email().to_string(),
            ..Self::default()
        }
    }
}

/// Profile editor prefilled from the current identity.
pub struct SettingsScreen {
    identity: Identity,
    data: Arc<dyn DataGateway>,
    auth: Arc<dyn AuthGateway>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    form: SettingsForm,
}

impl SettingsScreen {
    /// Open the screen for the session's identity.
    pub fn for_session(
        session: &SessionManager,
        data: Arc<dyn DataGateway>,
        auth: Arc<dyn AuthGateway>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let identity = session
            .identity()
            .ok_or_else(|| Error::unauthorized("sign in to change your settings"))?;
        Ok(Self {
            form: SettingsForm::prefilled(&identity),
            identity,
            data,
            auth,
            notifier,
            clock,
        })
    }

    /// Identity the form was filled from.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current form values.
    pub fn form(&self) -> &SettingsForm {
        &self.form
    }

    /// Mutable form values.
    pub fn form_mut(&mut self) -> &mut SettingsForm {
        &mut self.form
    }

    /// Save the form: profile row first, then the auth email when it
    /// changed, then the password when one was given. The session is
    /// refreshed afterwards so the new profile is published.
    pub async fn submit(&mut self, session: &SessionManager) -> Result<(), Error> {
        if !self.form.password.is_empty() && self.form.password != self.form.confirm_password {
            return Err(reject(
                self.notifier.as_ref(),
                Error::invalid_request(PASSWORD_MISMATCH),
            ));
        }
        let (name, email, password) = self
            .validated()
            .map_err(|err| reject(self.notifier.as_ref(), err))?;

        let mut patch = Record::new();
        patch.insert("name".to_owned(), Value::String(name.to_string()));
        patch.insert("email".to_owned(), Value::String(email.to_string()));
        patch.insert(
            "updated_at".to_owned(),
            Value::String(self.clock.utc().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.data
            .update(Table::Users, patch, &Filter::eq("id", self.identity.id().as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), UPDATE_PROFILE_FAILED, map_data_error(err))
            })?;

        if &email != self.identity.email() {
            self.update_account(AccountUpdate::email(email.clone())).await?;
        }
        if let Some(password) = password {
            self.update_account(AccountUpdate::password(password)).await?;
        }
        info!(user_id = %self.identity.id(), "profile updated");

        self.notifier
            .notify(Notification::success("Profile updated successfully"));
        self.form.password = Zeroizing::default();
        self.form.confirm_password = Zeroizing::default();
        self.identity = session
            .refresh()
            .await
            .identity()
            .cloned()
            .unwrap_or_else(|| self.identity.with_profile(name, email, self.identity.role()));
        Ok(())
    }

    async fn update_account(&self, update: AccountUpdate) -> Result<(), Error> {
        self.auth.update_user(&update).await.map_err(|err| {
            report_failure(self.notifier.as_ref(), UPDATE_PROFILE_FAILED, map_auth_error(err))
        })
    }

    fn validated(&self) -> Result<(DisplayName, Email, Option<Password>), Error> {
        let name = DisplayName::new(self.form.name.as_str())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let email = Email::new(self.form.email.as_str())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let password = if self.form.password.is_empty() {
            None
        } else {
            Some(
                Password::new_for_account(&self.form.password)
                    .map_err(|err| Error::invalid_request(err.to_string()))?,
            )
        };
        Ok((name, email, password))
    }
}
