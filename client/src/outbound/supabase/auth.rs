//! Reqwest-backed GoTrue adapter.
//!
//! Holds the session in memory on the shared [`Connection`] and publishes a
//! session-change event after every sign-in, sign-out and account update.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::dto::{
    ErrorBodyDto, PasswordBodyDto, SignUpResponseDto, TokenResponseDto, UserUpdateDto,
};
use super::{Connection, describe_failure};
use crate::domain::ports::{
    AuthEvent, AuthEventKind, AuthGateway, AuthGatewayError, SessionSubscription,
};
use crate::domain::{AccountUpdate, AuthSession, Credentials, Email, Password, UserId};

const TOKEN_PATH: &str = "auth/v1/token?grant_type=password";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";
const USER_PATH: &str = "auth/v1/user";

/// Auth gateway speaking the GoTrue HTTP API.
#[derive(Clone)]
pub struct SupabaseAuth {
    connection: Arc<Connection>,
}

impl SupabaseAuth {
    pub(super) fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    async fn current_session(&self) -> Option<AuthSession> {
        self.connection.session.read().await.clone()
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, AuthGatewayError> {
        self.connection
            .url(path)
            .map_err(|err| AuthGatewayError::transport(format!("invalid auth url: {err}")))
    }

    /// Revoke `access_token` remotely. The local session is already gone.
    async fn revoke(&self, access_token: &str) -> Result<(), AuthGatewayError> {
        let response = self
            .connection
            .client
            .post(self.url(LOGOUT_PATH)?)
            .header("apikey", self.connection.anon_key.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_transport_error)?;
        checked(response).await.map(|_| ())
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuth {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthGatewayError> {
        Ok(self.current_session().await)
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.connection.events.subscribe())
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthGatewayError> {
        let request = self
            .connection
            .client
            .post(self.url(TOKEN_PATH)?)
            .header("apikey", self.connection.anon_key.as_str())
            .bearer_auth(self.connection.anon_key.as_str())
            .json(&PasswordBodyDto::from_credentials(credentials));
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_transport_error)?;
            return Err(map_sign_in_error(status, body.as_ref()));
        }
        let session = decode::<TokenResponseDto>(response)
            .await?
            .into_session()
            .map_err(AuthGatewayError::decode)?;

        *self.connection.session.write().await = Some(session.clone());
        info!(user_id = %session.user_id(), "signed in");
        self.connection.publish(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &Email, password: &Password) -> Result<UserId, AuthGatewayError> {
        let request = self
            .connection
            .client
            .post(self.url(SIGNUP_PATH)?)
            .header("apikey", self.connection.anon_key.as_str())
            .bearer_auth(self.connection.anon_key.as_str())
            .json(&PasswordBodyDto::new(email, password));
        let response = checked(request.send().await.map_err(map_transport_error)?).await?;
        let user_id = decode::<SignUpResponseDto>(response)
            .await?
            .into_user_id()
            .map_err(AuthGatewayError::decode)?;
        info!(user_id = %user_id, "auth record created");
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        let Some(session) = self.connection.session.write().await.take() else {
            debug!("sign-out without a session");
            self.connection.publish(AuthEvent::signed_out());
            return Ok(());
        };
        let outcome = self.revoke(session.access_token()).await;
        if let Err(err) = &outcome {
            warn!(user_id = %session.user_id(), error = %err, "remote sign-out failed");
        } else {
            info!(user_id = %session.user_id(), "signed out");
        }
        self.connection.publish(AuthEvent::signed_out());
        outcome
    }

    async fn update_user(&self, update: &AccountUpdate) -> Result<(), AuthGatewayError> {
        let session = self
            .current_session()
            .await
            .ok_or_else(AuthGatewayError::no_session)?;
        if update.is_empty() {
            return Ok(());
        }
        let request = self
            .connection
            .authorize(self.connection.client.put(self.url(USER_PATH)?))
            .await
            .json(&UserUpdateDto::from(update));
        checked(request.send().await.map_err(map_transport_error)?).await?;
        info!(
            user_id = %session.user_id(),
            email_changed = update.email.is_some(),
            password_changed = update.password.is_some(),
            "account updated"
        );
        self.connection.publish(AuthEvent {
            kind: AuthEventKind::UserUpdated,
            session: Some(session),
        });
        Ok(())
    }
}

async fn checked(response: Response) -> Result<Response, AuthGatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.map_err(map_transport_error)?;
    Err(map_status_error(status, body.as_ref()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AuthGatewayError> {
    let body = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(body.as_ref())
        .map_err(|err| AuthGatewayError::decode(format!("invalid auth JSON payload: {err}")))
}

fn map_transport_error(error: reqwest::Error) -> AuthGatewayError {
    AuthGatewayError::transport(error.to_string())
}

fn map_sign_in_error(status: StatusCode, body: &[u8]) -> AuthGatewayError {
    let rejected_pair = ErrorBodyDto::parse(body).is_some_and(|parsed| parsed.is_invalid_grant());
    if rejected_pair && status.is_client_error() {
        AuthGatewayError::invalid_credentials()
    } else {
        map_status_error(status, body)
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthGatewayError {
    let message = describe_failure(status, body);
    if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        AuthGatewayError::transport(message)
    } else {
        AuthGatewayError::rejected(message)
    }
}
