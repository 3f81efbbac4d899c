use axum::{body::Body, response::Response};
use scraper::{Html, Selector};

async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8_lossy(&body).into_owned()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

/// For HTMX partials such as a re-rendered form or an alert.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The trimmed text of the first element matching `selector`.
#[track_caller]
pub(crate) fn text_of(html: &Html, selector: &str) -> String {
    html.select(&Selector::parse(selector).unwrap())
        .next()
        .unwrap_or_else(|| panic!("No element matches {selector}"))
        .text()
        .collect::<String>()
        .trim()
        .to_owned()
}

#[track_caller]
pub(crate) fn attr_of(html: &Html, selector: &str, attribute: &str) -> Option<String> {
    html.select(&Selector::parse(selector).unwrap())
        .next()
        .and_then(|element| element.value().attr(attribute))
        .map(str::to_owned)
}

#[track_caller]
pub(crate) fn alert_text(html: &Html) -> String {
    text_of(html, "[role=alert]")
}
