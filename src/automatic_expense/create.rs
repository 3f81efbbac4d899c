//! The page and endpoint for creating an automatic expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    automatic_expense::{AutomaticExpenseName, NewAutomaticExpense, db::create_automatic_expense},
    endpoints,
    expense::{Category, MAX_AMOUNT, YearMonth, category_radio_group, parse_amount},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner, rupee_input_styles,
    },
    navigation::NavBar,
    timezone::local_today,
};

const INVALID_DATA_MESSAGE: &str = "Invalid data. Please check all fields.";
const CREATE_FAILED_MESSAGE: &str = "Could not create automatic expense. Please try again.";

/// The form data for creating an automatic expense.
#[derive(Debug, Default, Deserialize)]
pub struct AutomaticExpenseForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl AutomaticExpenseForm {
    fn parse(&self) -> Result<NewAutomaticExpense, Error> {
        let name = AutomaticExpenseName::new(&self.name)?;
        let amount = parse_amount(&self.amount)?;
        let category: Category = self
            .category
            .as_deref()
            .unwrap_or_default()
            .parse()?;

        NewAutomaticExpense::new(name, amount, category)
    }
}

fn automatic_expense_form(form: &AutomaticExpenseForm, error_message: Option<&str>) -> Markup {
    let checked_category = form
        .category
        .as_deref()
        .and_then(|category| category.parse().ok());

    html! {
        form
            hx-post=(endpoints::AUTOMATIC_EXPENSES_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "New Automatic Expense" }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    name="name"
                    id="name"
                    type="text"
                    placeholder="e.g. Rent or Netflix"
                    value=(form.name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount per month" }

                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        inputmode="decimal"
                        step="0.01"
                        min="0.01"
                        max=(MAX_AMOUNT)
                        placeholder="0.00"
                        value=(form.amount)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            (category_radio_group(checked_category))

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Added on the first of every month, starting this month."
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator"
                {
                    (loading_spinner())
                }
                "Create"
            }
        }
    }
}

/// Renders the page for creating an automatic expense.
pub async fn get_new_automatic_expense_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_AUTOMATIC_EXPENSE_VIEW).into_html();
    let form = AutomaticExpenseForm {
        category: Some(Category::Rent.to_string()),
        ..Default::default()
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (automatic_expense_form(&form, None))
        }
    };

    base("New Automatic Expense", &[rupee_input_styles()], &content).into_response()
}

/// The state needed to create an automatic expense.
#[derive(Debug, Clone)]
pub struct CreateAutomaticExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateAutomaticExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for creating an automatic expense that starts in the
/// current month, redirects to the home page on success.
pub async fn create_automatic_expense_endpoint(
    State(state): State<CreateAutomaticExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AutomaticExpenseForm>,
) -> Response {
    let new_automatic_expense = match form.parse() {
        Ok(new_automatic_expense) => new_automatic_expense,
        Err(error) => {
            tracing::debug!("Invalid automatic expense form {form:?}: {error}");
            return automatic_expense_form(&form, Some(INVALID_DATA_MESSAGE)).into_response();
        }
    };

    let start_month = match local_today(&state.local_timezone) {
        Ok(today) => YearMonth::containing(today),
        Err(error) => {
            tracing::error!("Could not get the current month: {error}");
            return automatic_expense_form(&form, Some(CREATE_FAILED_MESSAGE)).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return automatic_expense_form(&form, Some(CREATE_FAILED_MESSAGE)).into_response();
        }
    };

    match create_automatic_expense(user_id, new_automatic_expense, start_month, &connection) {
        Ok(automatic_expense) => {
            tracing::info!(
                "User {user_id} created automatic expense {} starting {start_month}",
                automatic_expense.id
            );

            (
                HxRedirect(endpoints::HOME_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not create automatic expense: {error}");
            automatic_expense_form(&form, Some(CREATE_FAILED_MESSAGE)).into_response()
        }
    }
}
