//! Admin user management: list, create, update and delete profile rows.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use super::{collate, reject, report_failure};
use crate::domain::gateway_errors::{map_auth_error, map_data_error};
use crate::domain::ports::{
    AuthGateway, DataGateway, Filter, Notification, Notifier, Query, Record, Table,
    decode_record, decode_rows, encode_record,
};
use crate::domain::{
    AccountUpdate, AdminAccess, DisplayName, Email, Error, Identity, Password, Role,
    SessionManager, UserId,
};

/// Notification when a write is attempted after the admin demoted themselves.
pub const ADMIN_ACCESS_REVOKED: &str = "Admin access was removed from this account";
/// Notification when the user list cannot be read.
pub const LOAD_USERS_FAILED: &str = "Failed to load users";
/// Notification when a create or update fails.
pub const SAVE_USER_FAILED: &str = "Failed to save user";
/// Notification when a delete fails.
pub const DELETE_USER_FAILED: &str = "Failed to delete user";
/// Notification when an admin tries to delete their own row.
pub const DELETE_SELF_REJECTED: &str = "You cannot delete your own account";
/// Notification when a password change targets another user.
pub const FOREIGN_PASSWORD_REJECTED: &str = "Passwords can only be changed for your own account";

/// Validated form for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: DisplayName,
    /// Login email.
    pub email: Email,
    /// Initial password.
    pub password: Password,
    /// Role.
    pub role: Role,
}

impl NewUser {
    /// Validate raw form values.
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: DisplayName::new(name).map_err(|err| Error::invalid_request(err.to_string()))?,
            email: Email::new(email).map_err(|err| Error::invalid_request(err.to_string()))?,
            password: Password::new_for_account(password)
                .map_err(|err| Error::invalid_request(err.to_string()))?,
            role,
        })
    }
}

/// Validated edit form for an existing row.
#[derive(Debug, Clone)]
pub struct UserChanges {
    /// Display name.
    pub name: DisplayName,
    /// Contact email.
    pub email: Email,
    /// Role.
    pub role: Role,
    /// New password; only accepted for the signed-in admin's own row.
    pub password: Option<Password>,
}

impl UserChanges {
    /// Validate raw form values. An empty password means "unchanged".
    pub fn try_from_parts(
        name: &str,
        email: &str,
        role: Role,
        password: Option<&str>,
    ) -> Result<Self, Error> {
        let password = match password {
            Some(raw) if !raw.is_empty() => Some(
                Password::new_for_account(raw)
                    .map_err(|err| Error::invalid_request(err.to_string()))?,
            ),
            Some(_) | None => None,
        };
        Ok(Self {
            name: DisplayName::new(name).map_err(|err| Error::invalid_request(err.to_string()))?,
            email: Email::new(email).map_err(|err| Error::invalid_request(err.to_string()))?,
            role,
            password,
        })
    }
}

/// User CRUD screen. Requires [`AdminAccess`].
pub struct ManageUsersScreen {
    access: AdminAccess,
    data: Arc<dyn DataGateway>,
    auth: Arc<dyn AuthGateway>,
    notifier: Arc<dyn Notifier>,
    users: Vec<Identity>,
    loading: bool,
    revoked: bool,
}

impl ManageUsersScreen {
    /// Empty screen; call [`ManageUsersScreen::load`] to populate it.
    pub fn new(
        access: AdminAccess,
        data: Arc<dyn DataGateway>,
        auth: Arc<dyn AuthGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            access,
            data,
            auth,
            notifier,
            users: Vec::new(),
            loading: true,
            revoked: false,
        }
    }

    /// Fetch users ordered by name.
    pub async fn load(&mut self) -> Result<(), Error> {
        let fetched = self
            .data
            .select(Table::Users, &Query::new().order_by("name"))
            .await
            .and_then(decode_rows::<Identity>);
        self.loading = false;
        self.users = fetched.map_err(|err| {
            report_failure(self.notifier.as_ref(), LOAD_USERS_FAILED, map_data_error(err))
        })?;
        Ok(())
    }

    /// True until the first response arrives.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Users ordered by name.
    pub fn users(&self) -> &[Identity] {
        &self.users
    }

    /// Create the auth record, then the profile row keyed by its id.
    ///
    /// The admin stays signed in as themselves. When the profile insert
    /// fails the auth record is left behind and logged for cleanup.
    pub async fn create(&mut self, new_user: NewUser) -> Result<Identity, Error> {
        self.ensure_admin()?;
        let NewUser {
            name,
            email,
            password,
            role,
        } = new_user;
        let user_id = self
            .auth
            .sign_up(&email, &password)
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), SAVE_USER_FAILED, map_auth_error(err))
            })?;

        let identity = Identity::new(user_id.clone(), name, email, Some(role));
        let row = encode_record(&identity).map_err(|err| {
            report_failure(self.notifier.as_ref(), SAVE_USER_FAILED, map_data_error(err))
        })?;
        let stored = match self.data.insert(Table::Users, row).await {
            Ok(record) => decode_record::<Identity>(record).unwrap_or_else(|err| {
                warn!(
                    user_id = %user_id,
                    error = %err,
                    "inserted profile row could not be decoded; listing submitted values"
                );
                identity.clone()
            }),
            Err(err) => {
                error!(
                    auth_user_id = %user_id,
                    error = %err,
                    "profile insert failed; auth record left without profile row"
                );
                return Err(report_failure(
                    self.notifier.as_ref(),
                    SAVE_USER_FAILED,
                    map_data_error(err),
                ));
            }
        };
        info!(admin = %self.access.admin_id(), user_id = %stored.id(), "user created");
        self.users.push(stored.clone());
        self.sort_users();
        self.notifier
            .notify(Notification::success("User created successfully"));
        Ok(stored)
    }

    /// Update name, email and role of a listed user.
    ///
    /// A password is only accepted for the signed-in admin's own row and is
    /// sent to the auth gateway after the profile row was saved. Saving the
    /// own row refreshes `session`; when that drops the admin role, this
    /// screen refuses further writes.
    pub async fn update(
        &mut self,
        id: &UserId,
        changes: UserChanges,
        session: &SessionManager,
    ) -> Result<(), Error> {
        self.ensure_admin()?;
        let position = self.position(id)?;
        let own_row = id == self.access.admin_id();
        if changes.password.is_some() && !own_row {
            return Err(reject(
                self.notifier.as_ref(),
                Error::forbidden(FOREIGN_PASSWORD_REJECTED),
            ));
        }

        let UserChanges {
            name,
            email,
            role,
            password,
        } = changes;
        let mut patch = Record::new();
        patch.insert("name".to_owned(), Value::String(name.clone().into()));
        patch.insert("email".to_owned(), Value::String(email.clone().into()));
        patch.insert("role".to_owned(), Value::String(role.as_str().to_owned()));
        self.data
            .update(Table::Users, patch, &Filter::eq("id", id.as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), SAVE_USER_FAILED, map_data_error(err))
            })?;
        if let Some(entry) = self.users.get_mut(position) {
            *entry = entry.with_profile(name, email, Some(role));
        }
        self.sort_users();
        info!(admin = %self.access.admin_id(), user_id = %id, "user updated");

        if let Some(password) = password {
            self.auth
                .update_user(&AccountUpdate::password(password))
                .await
                .map_err(|err| {
                    report_failure(self.notifier.as_ref(), SAVE_USER_FAILED, map_auth_error(err))
                })?;
            info!(user_id = %id, "password changed");
        }
        if own_row {
            let state = session.refresh().await;
            if !state.is_admin() {
                info!(user_id = %id, "admin role removed from own account");
                self.revoked = true;
            }
        }
        self.notifier
            .notify(Notification::success("User updated successfully"));
        Ok(())
    }

    /// Delete a listed user's profile row. The signed-in admin's own row is
    /// refused before any remote call.
    pub async fn delete(&mut self, id: &UserId) -> Result<(), Error> {
        self.ensure_admin()?;
        if id == self.access.admin_id() {
            return Err(reject(
                self.notifier.as_ref(),
                Error::forbidden(DELETE_SELF_REJECTED),
            ));
        }
        self.position(id)?;
        self.data
            .delete(Table::Users, &Filter::eq("id", id.as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), DELETE_USER_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), user_id = %id, "user deleted");
        self.users.retain(|user| user.id() != id);
        self.notifier
            .notify(Notification::success("User deleted successfully"));
        Ok(())
    }

    fn ensure_admin(&self) -> Result<(), Error> {
        if self.revoked {
            return Err(reject(
                self.notifier.as_ref(),
                Error::forbidden(ADMIN_ACCESS_REVOKED),
            ));
        }
        Ok(())
    }

    fn position(&self, id: &UserId) -> Result<usize, Error> {
        self.users
            .iter()
            .position(|user| user.id() == id)
            .ok_or_else(|| Error::not_found(format!("user {id} is not listed")))
    }

    fn sort_users(&mut self) {
        self.users
            .sort_by(|a, b| collate(a.name().as_ref(), b.name().as_ref()));
    }
}

#[cfg(test)]
#[path = "manage_users_tests.rs"]
mod tests;
