//! Defines the endpoint for adding a manually entered expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::{
        Category, NewExpense,
        add_page::{ExpenseFormValues, add_expense_form},
        core::parse_amount,
        create_expense,
    },
};

/// Shown when the form data does not describe a valid expense.
const INVALID_EXPENSE_MESSAGE: &str = "Invalid expense data. Please check all fields.";
/// Shown when a valid expense could not be saved.
const SAVE_FAILED_MESSAGE: &str = "Could not save expense. Please try again.";

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The state needed to add an expense.
#[derive(Debug, Clone)]
pub struct AddExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AddExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for adding an expense.
///
/// Fields are kept as text so that bad input can be echoed back to the user.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseForm {
    /// The amount spent in rupees.
    #[serde(default)]
    pub amount: String,
    /// The date the money was spent, as YYYY-MM-DD.
    #[serde(default)]
    pub date: String,
    /// The name of a [Category].
    #[serde(default)]
    pub category: Option<String>,
    /// An optional description of the expense.
    #[serde(default)]
    pub note: Option<String>,
}

impl ExpenseForm {
    fn parse(&self) -> Result<NewExpense, Error> {
        let amount = parse_amount(&self.amount)?;
        let date = Date::parse(self.date.trim(), &DATE_FORMAT)
            .map_err(|_| Error::InvalidDate(self.date.clone()))?;
        let category: Category = self
            .category
            .as_deref()
            .unwrap_or_default()
            .parse()?;

        NewExpense::new(amount, date, category, self.note.as_deref())
    }

    fn values(&self) -> ExpenseFormValues<'_> {
        ExpenseFormValues {
            amount: &self.amount,
            date: &self.date,
            category: self
                .category
                .as_deref()
                .and_then(|category| category.parse().ok()),
            note: self.note.as_deref().unwrap_or_default(),
        }
    }

    fn into_error_response(self, error_message: &str) -> Response {
        add_expense_form(&self.values(), Some(error_message)).into_response()
    }
}

/// A route handler for adding an expense, redirects to the home page on success.
///
/// On failure the form is rendered again with an error message.
pub async fn add_expense_endpoint(
    State(state): State<AddExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let new_expense = match form.parse() {
        Ok(new_expense) => new_expense,
        Err(error) => {
            tracing::debug!("Invalid expense form {form:?}: {error}");
            return form.into_error_response(INVALID_EXPENSE_MESSAGE);
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return form.into_error_response(SAVE_FAILED_MESSAGE);
        }
    };

    match create_expense(user_id, new_expense, &connection) {
        Ok(expense) => {
            tracing::debug!("User {user_id} added expense {}", expense.id);

            (
                HxRedirect(endpoints::HOME_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            form.into_error_response(SAVE_FAILED_MESSAGE)
        }
    }
}
