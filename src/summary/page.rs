//! The monthly summary page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    expense::YearMonth,
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, CARD_TITLE_STYLE, HeadElement, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    summary::{
        aggregation::{MonthlySummary, get_monthly_summary},
        charts::{SummaryChart, category_chart, charts_script, charts_view},
    },
    timezone::local_today,
};

/// The month to summarize. Missing values default to the current year and month.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

/// The state needed for the summary page.
#[derive(Debug, Clone)]
pub struct SummaryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn month_url(month: YearMonth) -> String {
    format!(
        "{}?year={}&month={}",
        endpoints::SUMMARY_VIEW,
        month.year(),
        month.month() as u8
    )
}

fn month_toggle(month: YearMonth) -> Markup {
    html! {
        div class="flex w-full items-center justify-between"
        {
            a
                href=(month_url(month.previous()))
                id="previous-month"
                class=(BUTTON_SECONDARY_STYLE)
            {
                "‹ Previous"
            }

            h2 class="text-xl font-bold" { (month.display_name()) }

            a
                href=(month_url(month.next()))
                id="next-month"
                class=(BUTTON_SECONDARY_STYLE)
            {
                "Next ›"
            }
        }
    }
}

fn breakdown_table(summary: &MonthlySummary) -> Markup {
    html! {
        div class="w-full overflow-x-auto rounded-lg"
        {
            table class="w-full text-sm text-left"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                        th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Share" }
                    }
                }

                tbody
                {
                    @for item in &summary.breakdown {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (item.category) }
                            td class={(TABLE_CELL_STYLE) " text-right"} { (format_currency(item.amount)) }
                            td class={(TABLE_CELL_STYLE) " text-right"} { (format!("{:.1}%", item.percentage)) }
                        }
                    }
                }
            }
        }
    }
}

fn summary_view(summary: &MonthlySummary) -> Markup {
    let nav_bar = NavBar::new(endpoints::SUMMARY_VIEW).into_html();
    let charts = if summary.breakdown.is_empty() {
        Vec::new()
    } else {
        vec![SummaryChart {
            id: "category-chart",
            options: category_chart(&summary.breakdown).to_string(),
        }]
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (month_toggle(summary.month))

            div class=(CARD_STYLE)
            {
                p class=(CARD_TITLE_STYLE) { "Total spent" }
                p id="month-total" class="text-2xl font-bold" { (format_currency(summary.total)) }
                p id="insight" class="mt-1 text-sm text-gray-600 dark:text-gray-300" { (summary.insight) }
            }

            @if !summary.breakdown.is_empty() {
                (charts_view(&charts))
                (breakdown_table(summary))
            }
        }
    };

    let head_elements = if charts.is_empty() {
        Vec::new()
    } else {
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(&charts),
        ]
    };

    base("Summary", &head_elements, &content)
}

/// Display the spending for a month, broken down by category.
pub async fn get_summary_page(
    State(state): State<SummaryPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let month = YearMonth::new(
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month() as u8),
    )?;

    let summary = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_monthly_summary(user_id, month, &connection)
            .inspect_err(|error| tracing::error!("Could not get summary for {month}: {error}"))?
    };

    Ok(summary_view(&summary).into_response())
}

#[cfg(test)]
mod summary_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        auth::{EmailAddress, UserID, upsert_user},
        db::initialize,
        expense::{Category, NewExpense, YearMonth, create_expense},
        test_utils::{assert_status_ok, assert_valid_html, attr_of, parse_html_document, text_of},
    };

    use super::{SummaryPageState, SummaryQuery, get_summary_page};

    fn get_state() -> (SummaryPageState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = upsert_user(
            &EmailAddress::new("test@example.com").unwrap(),
            None,
            None,
            &connection,
        )
        .unwrap()
        .id;

        for (amount, date, category) in [
            (500.0, date!(2024 - 03 - 01), Category::Rent),
            (120.0, date!(2024 - 03 - 05), Category::Food),
            (80.0, date!(2024 - 03 - 20), Category::Food),
            (999.0, date!(2024 - 04 - 01), Category::Travel),
        ] {
            let new_expense = NewExpense::new(amount, date, category, None).unwrap();
            create_expense(user_id, new_expense, &connection).unwrap();
        }

        (
            SummaryPageState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn shows_breakdown_for_requested_month() {
        let (state, user_id) = get_state();
        let query = SummaryQuery {
            year: Some(2024),
            month: Some(3),
        };

        let response = get_summary_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(text_of(&document, "h2"), "March 2024");
        assert_eq!(text_of(&document, "#month-total"), "₹700.00");
        assert_eq!(text_of(&document, "#insight"), "Most spent on Rent (₹500.00)");
        let rows: Vec<String> = document
            .select(&Selector::parse("tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect())
            .collect();
        assert_eq!(rows, vec!["Rent", "Food"]);
        assert!(
            document
                .select(&Selector::parse("#category-chart").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn month_toggles_cross_year_boundaries() {
        let (state, user_id) = get_state();
        let query = SummaryQuery {
            year: Some(2024),
            month: Some(1),
        };

        let response = get_summary_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let href = |selector: &str| attr_of(&document, selector, "href");
        assert_eq!(
            href("#previous-month").as_deref(),
            Some("/summary?year=2023&month=12")
        );
        assert_eq!(href("#next-month").as_deref(), Some("/summary?year=2024&month=2"));
    }

    #[tokio::test]
    async fn empty_month_shows_no_expenses_message() {
        let (state, user_id) = get_state();
        let query = SummaryQuery {
            year: Some(2023),
            month: Some(6),
        };

        let response = get_summary_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(text_of(&document, "#month-total"), "₹0.00");
        assert_eq!(text_of(&document, "#insight"), "No expenses this month.");
        assert!(document.select(&Selector::parse("table").unwrap()).next().is_none());
    }

    #[tokio::test]
    async fn defaults_to_current_month() {
        let (state, user_id) = get_state();

        let response = get_summary_page(State(state), Extension(user_id), Query(SummaryQuery::default()))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let this_month = YearMonth::containing(OffsetDateTime::now_utc().date());
        assert_eq!(text_of(&document, "h2"), this_month.display_name());
    }

    #[tokio::test]
    async fn invalid_month_is_bad_request() {
        let (state, user_id) = get_state();
        let query = SummaryQuery {
            year: Some(2024),
            month: Some(13),
        };

        let result = get_summary_page(State(state), Extension(user_id), Query(query)).await;

        let Err(error) = result else {
            panic!("want an error for month 13");
        };
        assert!(matches!(error, Error::InvalidYearMonth(_)));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
