//! The home page: what was spent today and this month, the latest expenses
//! and the user's automatic expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    automatic_expense::{
        AutomaticExpense, ensure_automatic_expenses_for_month, list_active_automatic_expenses,
    },
    endpoints::{self, format_endpoint},
    expense::{Expense, YearMonth, get_month_total, get_recent_expenses, get_today_total},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE,
        CARD_TITLE_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// How many of the latest expenses to show.
const RECENT_EXPENSE_COUNT: u32 = 3;

/// The state needed for the home page.
#[derive(Debug, Clone)]
pub struct HomePageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HomePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

struct HomeData {
    greeting_name: String,
    today_total: f64,
    month_total: f64,
    month: YearMonth,
    recent_expenses: Vec<Expense>,
    automatic_expenses: Vec<AutomaticExpense>,
}

/// e.g. "15 Mar"
fn short_date(date: Date) -> String {
    let month = date.month().to_string();

    format!("{} {}", date.day(), month.get(..3).unwrap_or(&month))
}

fn totals_view(data: &HomeData) -> Markup {
    html! {
        div class="grid w-full grid-cols-2 gap-4"
        {
            div class=(CARD_STYLE)
            {
                p class=(CARD_TITLE_STYLE) { "Today" }
                p id="today-total" class="text-2xl font-bold" { (format_currency(data.today_total)) }
            }

            div class=(CARD_STYLE)
            {
                p class=(CARD_TITLE_STYLE) { (data.month.month()) }
                p id="month-total" class="text-2xl font-bold" { (format_currency(data.month_total)) }
            }
        }
    }
}

fn recent_expenses_view(expenses: &[Expense]) -> Markup {
    html! {
        section id="recent-expenses" class=(CARD_STYLE)
        {
            h2 class="mb-2 text-lg font-semibold" { "Recent expenses" }

            @if expenses.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No expenses yet. "
                    (link(endpoints::ADD_EXPENSE_VIEW, "Add your first one"))
                }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for expense in expenses {
                        li class="flex items-center justify-between py-2"
                        {
                            div
                            {
                                p class="font-medium" { (expense.category) }

                                p class="text-xs text-gray-500 dark:text-gray-400"
                                {
                                    (short_date(expense.date))

                                    @if let Some(note) = &expense.note {
                                        " · " (note)
                                    }
                                }
                            }

                            span class="font-semibold" { (format_currency(expense.amount)) }
                        }
                    }
                }
            }
        }
    }
}

fn automatic_expenses_view(automatic_expenses: &[AutomaticExpense]) -> Markup {
    html! {
        section id="automatic-expenses" class=(CARD_STYLE)
        {
            div class="mb-2 flex items-center justify-between"
            {
                h2 class="text-lg font-semibold" { "Automatic expenses" }

                a href=(endpoints::NEW_AUTOMATIC_EXPENSE_VIEW) class=(BUTTON_SECONDARY_STYLE)
                {
                    "+ New"
                }
            }

            @if automatic_expenses.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Add rent, bills or subscriptions once and they are added every month."
                }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for automatic_expense in automatic_expenses {
                        li class="py-3"
                        {
                            div class="flex items-center justify-between"
                            {
                                div
                                {
                                    p class="font-medium" { (automatic_expense.name) }
                                    p class="text-xs text-gray-500 dark:text-gray-400"
                                    {
                                        (automatic_expense.category)
                                    }
                                }

                                span class="font-semibold"
                                {
                                    (format_currency(automatic_expense.amount)) " / month"
                                }
                            }

                            div class="mt-2 flex gap-2"
                            {
                                button
                                    type="button"
                                    hx-post=(format_endpoint(endpoints::SKIP_AUTOMATIC_EXPENSE, automatic_expense.id))
                                    hx-target-error="#alert-container"
                                    class=(BUTTON_SECONDARY_STYLE)
                                {
                                    "Skip this month"
                                }

                                button
                                    type="button"
                                    hx-delete=(format_endpoint(endpoints::AUTOMATIC_EXPENSE, automatic_expense.id))
                                    hx-confirm={"Remove " (automatic_expense.name) " forever? Expenses already added are kept."}
                                    hx-target-error="#alert-container"
                                    class=(BUTTON_DELETE_STYLE)
                                {
                                    "Remove forever"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn home_view(data: &HomeData) -> Markup {
    let nav_bar = NavBar::new(endpoints::HOME_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="w-full text-2xl font-bold" { "Hi, " (data.greeting_name) }

            (totals_view(data))

            a href=(endpoints::ADD_EXPENSE_VIEW) class={(BUTTON_PRIMARY_STYLE) " text-center"}
            {
                "Add expense"
            }

            (recent_expenses_view(&data.recent_expenses))

            (automatic_expenses_view(&data.automatic_expenses))
        }
    };

    base("Home", &[], &content)
}

/// The first name if the user has one, otherwise their email address.
fn greeting_name(name: Option<&str>, email: &str) -> String {
    name.and_then(|name| name.split_whitespace().next())
        .unwrap_or(email)
        .to_owned()
}

/// Display the home page.
///
/// Adds this month's automatic expenses first. If that fails, the error is
/// logged and the page shows the expenses that already exist.
pub async fn get_home_page(
    State(state): State<HomePageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)
        .inspect_err(|_| tracing::error!("Invalid timezone {}", state.local_timezone))?;
    let month = YearMonth::containing(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if let Err(error) = ensure_automatic_expenses_for_month(user_id, month, &connection) {
        tracing::error!("Could not add automatic expenses for user {user_id} in {month}: {error}");
    }

    let user = get_user_by_id(user_id, &connection)?;

    let data = HomeData {
        greeting_name: greeting_name(user.name.as_deref(), &user.email),
        today_total: get_today_total(user_id, today, &connection)?,
        month_total: get_month_total(user_id, month, &connection)?,
        month,
        recent_expenses: get_recent_expenses(user_id, RECENT_EXPENSE_COUNT, &connection)?,
        automatic_expenses: list_active_automatic_expenses(user_id, &connection)?,
    };

    Ok(home_view(&data).into_response())
}
