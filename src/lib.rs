//! Spendwise is a mobile-first web app for keeping track of personal expenses.
//!
//! This library provides a REST API that directly serves HTML pages. Users
//! log manual expenses, set up automatic (monthly recurring) expenses and view
//! a per-category summary of each month.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod automatic_expense;
mod config;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod home;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod summary;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{EmailAddress, User, UserID, upsert_user};
pub use automatic_expense::{
    AutomaticExpenseName, NewAutomaticExpense, ReconcileReport, create_automatic_expense,
    ensure_automatic_expenses_for_month,
};
pub use config::{Config, ConfigError, RawConfig};
pub use db::initialize as initialize_db;
pub use expense::{Category, Expense, ExpenseSource, NewExpense, YearMonth, create_expense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::local_today;

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Errors fall into two tiers: validation errors caused by bad user input
/// (see [Error::is_validation_error]) and everything else. Neither tier is
/// shown to the user with technical detail.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An amount that is not greater than zero or is over the largest
    /// allowed amount was given for an expense or automatic expense.
    #[error("{0} is not a valid amount, amounts must be greater than zero and at most 1,000,000,000")]
    InvalidAmount(f64),

    /// The string could not be parsed as a number.
    #[error("\"{0}\" is not a valid number")]
    InvalidNumber(String),

    /// The string could not be parsed as a date in the format YYYY-MM-DD.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The string does not name one of the expense categories.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// The string does not name one of the expense sources.
    #[error("\"{0}\" is not a valid expense source")]
    InvalidExpenseSource(String),

    /// An empty string was used to name an automatic expense.
    #[error("Automatic expense name cannot be empty")]
    EmptyAutomaticExpenseName,

    /// A string or year/month pair that is not a valid calendar month.
    #[error("\"{0}\" is not a valid year and month")]
    InvalidYearMonth(String),

    /// The identity forwarded by the authenticating proxy is missing or
    /// malformed.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The request claimed to come from the authenticating proxy but did not
    /// carry the shared proxy secret.
    #[error("the request did not come from the trusted authentication proxy")]
    UntrustedProxy,

    /// The session token cookie is missing from the cookie jar in the request.
    #[error("no session token in the cookie jar")]
    CookieMissing,

    /// The session token cookie could not be parsed or has expired.
    #[error("invalid session token: {0}")]
    InvalidToken(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to skip an automatic expense that does not exist or belongs to
    /// another user.
    #[error("tried to skip an automatic expense that is not in the database")]
    SkipMissingAutomaticExpense,

    /// Tried to remove an automatic expense that does not exist or belongs to
    /// another user.
    #[error("tried to remove an automatic expense that is not in the database")]
    RemoveMissingAutomaticExpense,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// Whether the error was caused by invalid user input, as opposed to a
    /// failure of the server or the database.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount(_)
                | Error::InvalidNumber(_)
                | Error::InvalidDate(_)
                | Error::InvalidCategory(_)
                | Error::InvalidExpenseSource(_)
                | Error::EmptyAutomaticExpenseName
                | Error::InvalidYearMonth(_)
        )
    }
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

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidYearMonth(_) => InternalServerError {
                status: StatusCode::BAD_REQUEST,
                header: "400",
                description: "Invalid month",
                fix: "Please check the year and month and try again.",
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
                ..Default::default()
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            error if error.is_validation_error() => Alert::Error {
                message: "Invalid data".to_owned(),
                details: "Please check all fields.".to_owned(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::SkipMissingAutomaticExpense => Alert::Error {
                message: "Could not skip automatic expense".to_owned(),
                details: "Automatic expense not found. \
                    Try refreshing the page to see if it has been removed."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::RemoveMissingAutomaticExpense => Alert::Error {
                message: "Could not remove automatic expense".to_owned(),
                details: "Automatic expense not found. \
                    Try refreshing the page to see if it has already been removed."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "Please try again.".to_owned(),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
