//! Error types for the web service

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use common::error::DatabaseError;
use thiserror::Error;
use tracing::error;

use crate::{gateway::GatewayError, views};

/// Failures surfaced by the auth and code lifecycle services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Bad or missing input
    #[error("{0}")]
    Validation(String),

    /// No session where one is required
    #[error("You must be logged in to generate QR codes.")]
    AuthRequired,

    /// Login failure, identical for unknown users and wrong passwords
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Username already exists.")]
    DuplicateUsername,

    /// Too many failed logins for this username
    #[error("Too many failed login attempts. Please try again later.")]
    TooManyAttempts,

    #[error("{}", .0.user_message())]
    GenerationFailed(#[source] GatewayError),

    #[error("QR Code not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Infrastructure failures the user cannot fix by changing their input
    pub fn is_internal(&self) -> bool {
        matches!(self, ServiceError::Database(_) | ServiceError::Internal(_))
    }

    /// Text safe to show on a page
    pub fn user_message(&self) -> String {
        if self.is_internal() {
            "Something went wrong. Please try again.".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A service error that escaped a handler and becomes a whole page
///
/// Handlers render recoverable errors inline next to the form; everything
/// that reaches this type is answered with its own status.
#[derive(Debug)]
pub struct PageError(pub ServiceError);

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        PageError(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::NotFound => {
                (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response()
            }
            ServiceError::AuthRequired => Redirect::to("/login").into_response(),
            err if err.is_internal() => {
                error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page(&err.user_message())),
                )
                    .into_response()
            }
            err => (
                StatusCode::BAD_REQUEST,
                Html(views::error_page(&err.user_message())),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ServiceError::AuthRequired.user_message(),
            "You must be logged in to generate QR codes."
        );
        assert_eq!(
            ServiceError::GenerationFailed(GatewayError::Status(500)).user_message(),
            "Unexpected response format or status code"
        );
        assert_eq!(
            ServiceError::GenerationFailed(GatewayError::Timeout).user_message(),
            "An error occurred while generating the QR code"
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = ServiceError::Database(DatabaseError::Migration("secret detail".to_string()));
        assert!(err.is_internal());
        assert!(!err.user_message().contains("secret detail"));
    }

    #[test]
    fn test_page_error_status_codes() {
        let not_found = PageError(ServiceError::NotFound).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let login = PageError(ServiceError::AuthRequired).into_response();
        assert_eq!(login.status(), StatusCode::SEE_OTHER);
        assert_eq!(login.headers()["location"], "/login");

        let internal = PageError(ServiceError::Internal("boom".to_string())).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
