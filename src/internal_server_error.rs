//! Defines the page to display when a request cannot be completed because of
//! a server-side problem.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// A full-page error. Defaults to 500 Internal Server Error.
pub struct InternalServerError<'a> {
    pub status: StatusCode,
    /// The large text at the top of the page, usually the status code.
    pub header: &'a str,
    pub description: &'a str,
    /// What the user can do about it.
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            header: "500",
            description: "Sorry, something went wrong.",
            fix: "Please try again later.",
        }
    }
}

impl InternalServerError<'_> {
    pub fn into_html(self) -> Html<String> {
        Html(error_view("Something Went Wrong", self.header, self.description, self.fix).into_string())
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let status = self.status;

        (status, self.into_html()).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}
