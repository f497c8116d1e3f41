//! Grex Finances is a personal finance tracker.
//!
//! This library provides a JSON REST API for recording bank accounts, credit
//! cards, categories, transactions and recurring transactions, and for
//! reporting on them with cash flow, income statement and breakdown reports.
//!
//! Every route except registration and log in requires a bearer token, and
//! every record is scoped to the user the token belongs to.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod calendar;
mod category;
mod credit_card;
mod database_id;
mod db;
mod endpoints;
mod error;
mod logging;
mod money;
mod pagination;
mod recurring;
mod report;
mod routing;
mod timezone;
mod transaction;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DEFAULT_TOKEN_DURATION};
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, get_user_by_email, update_password};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}
