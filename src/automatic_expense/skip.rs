//! Endpoint for skipping an automatic expense for the current month.

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
    AppState, Error,
    alert::Alert,
    auth::UserID,
    automatic_expense::db::skip_automatic_expense,
    database_id::DatabaseId,
    endpoints,
    expense::YearMonth,
    timezone::local_today,
};

/// The state needed for skipping an automatic expense.
#[derive(Debug, Clone)]
pub struct SkipAutomaticExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for SkipAutomaticExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn skip_failed_response() -> Response {
    Alert::Error {
        message: "Could not skip automatic expense".to_owned(),
        details: "Please try again.".to_owned(),
    }
    .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Skip an automatic expense for the current month and remove this month's
/// expense for it, then redirect to the home page.
pub async fn skip_automatic_expense_endpoint(
    Path(automatic_expense_id): Path<DatabaseId>,
    State(state): State<SkipAutomaticExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let month = match local_today(&state.local_timezone) {
        Ok(today) => YearMonth::containing(today),
        Err(error) => {
            tracing::error!("Could not get the current month: {error}");
            return skip_failed_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return skip_failed_response();
        }
    };

    match skip_automatic_expense(user_id, automatic_expense_id, month, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::HOME_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::SkipMissingAutomaticExpense) => {
            tracing::warn!(
                "User {user_id} tried to skip missing automatic expense {automatic_expense_id}"
            );
            Error::SkipMissingAutomaticExpense.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while skipping automatic expense {automatic_expense_id}: {error}"
            );
            skip_failed_response()
        }
    }
}

#[cfg(test)]
mod skip_automatic_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        auth::{EmailAddress, UserID, upsert_user},
        automatic_expense::{
            AutomaticExpenseName, NewAutomaticExpense, create_automatic_expense,
            ensure_automatic_expenses_for_month,
        },
        db::initialize,
        endpoints,
        expense::{Category, YearMonth, get_month_total},
        test_utils::{alert_text, assert_hx_redirect, parse_html_fragment},
    };

    use super::{SkipAutomaticExpenseState, skip_automatic_expense_endpoint};

    fn this_month() -> YearMonth {
        YearMonth::containing(OffsetDateTime::now_utc().date())
    }

    fn get_state() -> (SkipAutomaticExpenseState, UserID, i64) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = upsert_user(
            &EmailAddress::new("test@example.com").unwrap(),
            None,
            None,
            &connection,
        )
        .unwrap();
        let rent = NewAutomaticExpense::new(
            AutomaticExpenseName::new_unchecked("Rent"),
            500.0,
            Category::Rent,
        )
        .unwrap();
        let automatic_expense =
            create_automatic_expense(user.id, rent, this_month(), &connection).unwrap();
        ensure_automatic_expenses_for_month(user.id, this_month(), &connection).unwrap();

        (
            SkipAutomaticExpenseState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
            automatic_expense.id,
        )
    }

    #[tokio::test]
    async fn skip_removes_this_months_expense_and_redirects_home() {
        let (state, user_id, automatic_expense_id) = get_state();

        let response = skip_automatic_expense_endpoint(
            Path(automatic_expense_id),
            State(state.clone()),
            Extension(user_id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::HOME_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_month_total(user_id, this_month(), &connection), Ok(0.0));
        let report =
            ensure_automatic_expenses_for_month(user_id, this_month(), &connection).unwrap();
        assert_eq!(report.created, 0);
    }

    #[tokio::test]
    async fn skip_missing_automatic_expense_returns_not_found_alert() {
        let (state, user_id, automatic_expense_id) = get_state();

        let response = skip_automatic_expense_endpoint(
            Path(automatic_expense_id + 100),
            State(state),
            Extension(user_id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        let text = alert_text(&html);
        assert!(
            text.contains("Automatic expense not found."),
            "got alert text {text:?}"
        );
    }

    #[tokio::test]
    async fn cannot_skip_another_users_automatic_expense() {
        let (state, _, automatic_expense_id) = get_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            upsert_user(
                &EmailAddress::new("other@example.com").unwrap(),
                None,
                None,
                &connection,
            )
            .unwrap()
            .id
        };

        let response = skip_automatic_expense_endpoint(
            Path(automatic_expense_id),
            State(state),
            Extension(other_user),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
