//! Defines the route handler and form for the page for adding an expense.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error, endpoints,
    expense::{Category, MAX_AMOUNT},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner, rupee_input_styles,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The values to prefill the add expense form with.
#[derive(Debug, Clone, Default)]
pub(super) struct ExpenseFormValues<'a> {
    pub amount: &'a str,
    pub date: &'a str,
    pub category: Option<Category>,
    pub note: &'a str,
}

/// Radio buttons for picking a category, one per [Category].
///
/// `checked` is the category that starts selected, if any.
pub(crate) fn category_radio_group(checked: Option<Category>) -> Markup {
    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Category" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for category in Category::ALL {
                    @let id = format!("category-{}", category.as_str().to_lowercase());

                    div
                    {
                        input
                            name="category"
                            id=(id)
                            type="radio"
                            value=(category)
                            checked[checked == Some(category)]
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE)
                        {
                            (category)
                        }
                    }
                }
            }
        }
    }
}

/// The add expense form.
///
/// The endpoint swaps the whole form with a new copy carrying `error_message`
/// when the expense cannot be saved, so the user keeps what they typed.
pub(super) fn add_expense_form(values: &ExpenseFormValues, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::EXPENSES_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Add Expense" }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                // w-full needed to ensure input takes the full width when prefilled with a value
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
                        value=(values.amount)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            (category_radio_group(values.category))

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(values.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="note" class=(FORM_LABEL_STYLE) { "Note (optional)" }

                input
                    name="note"
                    id="note"
                    type="text"
                    placeholder="e.g. Lunch with friends"
                    value=(values.note)
                    class=(FORM_TEXT_INPUT_STYLE);
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
                "Save"
            }
        }
    }
}

fn add_expense_view(values: &ExpenseFormValues) -> Markup {
    let nav_bar = NavBar::new(endpoints::ADD_EXPENSE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (add_expense_form(values, None))
        }
    };

    base("Add Expense", &[rupee_input_styles()], &content)
}

/// The state needed for the add expense page.
#[derive(Debug, Clone)]
pub struct AddExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
}

impl FromRef<AppState> for AddExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for adding an expense, with the date set to today.
pub async fn get_add_expense_page(
    State(state): State<AddExpensePageState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)
        .inspect_err(|_| tracing::error!("Invalid timezone {}", state.local_timezone))?
        .to_string();

    let values = ExpenseFormValues {
        date: &today,
        category: Some(Category::Food),
        ..Default::default()
    };

    Ok(add_expense_view(&values).into_response())
}

#[cfg(test)]
mod add_expense_page_tests {
    use axum::extract::State;
    use time::OffsetDateTime;

    use crate::{
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_radio_group,
            assert_status_ok, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    use super::{AddExpensePageState, get_add_expense_page};

    #[tokio::test]
    async fn add_expense_page_returns_form() {
        let state = AddExpensePageState {
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_add_expense_page(State(state)).await.unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::EXPENSES_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input_with_value(
            &form,
            "date",
            "date",
            &OffsetDateTime::now_utc().date().to_string(),
        );
        assert_form_submit_button_with_text(&form, "Save");
    }

    #[tokio::test]
    async fn add_expense_page_offers_every_category() {
        let state = AddExpensePageState {
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_add_expense_page(State(state)).await.unwrap();

        let document = parse_html_document(response).await;
        assert_radio_group(
            &document,
            "category",
            &["Food", "Rent", "Travel", "Bills", "Other"],
            "Food",
        );
    }

    #[tokio::test]
    async fn add_expense_page_fails_with_invalid_timezone() {
        let state = AddExpensePageState {
            local_timezone: "Not/A_Timezone".to_owned(),
        };

        let result = get_add_expense_page(State(state)).await;

        assert!(result.is_err());
    }
}
