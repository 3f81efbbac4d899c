//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// An alert message with optional details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something worked.
    Success { message: String, details: String },
    /// Something worked and there is nothing more to say.
    SuccessSimple { message: String },
    /// Something went wrong. `details` tells the user what they can do about it.
    Error { message: String, details: String },
}

impl Alert {
    fn into_html(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, details),
            Alert::SuccessSimple { message } => (false, message, String::new()),
            Alert::Error { message, details } => (true, message, details),
        };

        let container_style = if is_error {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 \
            dark:text-red-400 border border-red-300 dark:border-red-800 shadow-lg"
        } else {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 dark:bg-gray-800 \
            dark:text-green-400 border border-green-300 dark:border-green-800 shadow-lg"
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 6rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class=(container_style)
                {
                    div class="flex items-start justify-between gap-4"
                    {
                        div
                        {
                            p class="font-semibold" { (message) }

                            @if !details.is_empty() {
                                span class="block mt-1" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Dismiss"
                            class="font-bold"
                            onclick="this.closest('#alert-container').classList.add('hidden')"
                        {
                            "×"
                        }
                    }
                }
            }
        }
    }

    /// Render the alert with a status code other than 200 OK.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Html(self.into_html().into_string())).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::OK)
    }
}

#[cfg(test)]
mod alert_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        alert::Alert,
        test_utils::{alert_text, assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn error_alert_shows_message_and_details() {
        let response = Alert::Error {
            message: "Oh no".to_owned(),
            details: "Try again.".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = alert_text(&html);
        assert!(text.contains("Oh no"), "got alert text {text:?}");
        assert!(text.contains("Try again."), "got alert text {text:?}");
    }

    #[tokio::test]
    async fn simple_success_alert_is_ok() {
        let response = Alert::SuccessSimple {
            message: "Done".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
