//! Translation of gateway port errors into domain errors.

use crate::domain::Error;
use crate::domain::ports::{AuthGatewayError, DataGatewayError};

/// Message shown when sign-in credentials are refused.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login credentials";

pub(crate) fn map_data_error(error: DataGatewayError) -> Error {
    match error {
        DataGatewayError::Connection { message } | DataGatewayError::Timeout { message } => {
            Error::service_unavailable(format!("data gateway unavailable: {message}"))
        }
        DataGatewayError::Unauthorized { message } => {
            Error::unauthorized(format!("session rejected: {message}"))
        }
        DataGatewayError::Forbidden { message } => {
            Error::forbidden(format!("permission denied: {message}"))
        }
        DataGatewayError::NotFound { message } => {
            Error::not_found(format!("record not found: {message}"))
        }
        DataGatewayError::Conflict { message } => {
            Error::conflict(format!("conflicting record: {message}"))
        }
        DataGatewayError::Rejected { status, message } => {
            Error::invalid_request(format!("request rejected: {message}"))
                .with_details(serde_json::json!({ "status": status }))
        }
        DataGatewayError::Decode { message } => {
            Error::internal(format!("unexpected data gateway response: {message}"))
        }
    }
}

pub(crate) fn map_auth_error(error: AuthGatewayError) -> Error {
    match error {
        AuthGatewayError::InvalidCredentials => Error::unauthorized(INVALID_CREDENTIALS_MESSAGE),
        AuthGatewayError::Rejected { message } => {
            Error::invalid_request(format!("auth request rejected: {message}"))
        }
        AuthGatewayError::Transport { message } => {
            Error::service_unavailable(format!("auth gateway unavailable: {message}"))
        }
        AuthGatewayError::Decode { message } => {
            Error::internal(format!("unexpected auth gateway response: {message}"))
        }
        AuthGatewayError::NoSession => Error::unauthorized("no active session"),
    }
}
