//! Endpoint for removing an automatic expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::UserID, automatic_expense::db::remove_automatic_expense,
    database_id::DatabaseId, endpoints,
};

/// The state needed for removing an automatic expense.
#[derive(Debug, Clone)]
pub struct RemoveAutomaticExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RemoveAutomaticExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Stop adding an automatic expense in future months, then redirect to the home page.
pub async fn remove_automatic_expense_endpoint(
    Path(automatic_expense_id): Path<DatabaseId>,
    State(state): State<RemoveAutomaticExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match remove_automatic_expense(user_id, automatic_expense_id, &connection) {
        Ok(()) => {
            tracing::info!("User {user_id} removed automatic expense {automatic_expense_id}");

            (
                HxRedirect(endpoints::HOME_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::RemoveMissingAutomaticExpense) => {
            Error::RemoveMissingAutomaticExpense.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while removing automatic expense {automatic_expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
