//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination does not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The bearer token is missing, malformed or has expired.
    #[error("missing or invalid bearer token")]
    InvalidToken,

    /// A JSON Web Token could not be created.
    ///
    /// The error string should only be logged on the server.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address could not be parsed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// A user with the same email address is already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A field in a request body failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the offending field as it appears in the request.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A request referred to an account, credit card, category or recurring
    /// transaction that does not exist or belongs to another user.
    #[error("{0} does not exist")]
    InvalidReference(String),

    /// A record with the same name already exists for the user.
    #[error("\"{0}\" already exists")]
    DuplicateName(String),

    /// The pagination or sorting query parameters are invalid.
    #[error("invalid pagination parameters: {0}")]
    InvalidPagination(String),

    /// The report filter is invalid, e.g. the start date is after the end date.
    #[error("invalid report filter: {0}")]
    InvalidReportFilter(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The server's timezone setting is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::InvalidField { .. }
            | Error::InvalidReference(_)
            | Error::InvalidPagination(_)
            | Error::InvalidReportFilter(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail | Error::DuplicateName(_) => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors are not intended to be shown to the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
