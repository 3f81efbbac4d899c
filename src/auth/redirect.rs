//! Helpers for redirect URLs during sign-in.
//!
//! Only same-site relative paths are accepted so that the `redirect_url`
//! query parameter cannot be used to send users to another site.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::SIGN_IN_VIEW && path != endpoints::AUTH_CALLBACK
}

/// Reduce `raw_url` to a relative path and query, or `None` if it points
/// off-site or back into the sign-in flow.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

fn normalize_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The sign-in page URL that brings the user back to where `request` was
/// headed once they have signed in.
///
/// For `/api` requests made by HTMX, the page the user was on
/// (`HX-Current-URL`) is used instead of the API route.
pub fn build_sign_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        redirect_target_from_request_uri(request)?
    };

    build_sign_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_sign_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::SIGN_IN_VIEW, param)),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_request_uri(request: &Request) -> Option<String> {
    let path_and_query = request.uri().path_and_query()?.as_str();
    normalize_redirect_url(path_and_query)
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .map(|header| header.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if !hx_request {
        warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let redirect_url = normalize_hx_current_url(current_url);
    if redirect_url.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_sign_in_redirect_url, normalize_redirect_url};

    #[test]
    fn keeps_relative_path_and_query() {
        assert_eq!(
            normalize_redirect_url("/summary?year=2024&month=3").as_deref(),
            Some("/summary?year=2024&month=3")
        );
    }

    #[test]
    fn rejects_off_site_urls() {
        assert_eq!(normalize_redirect_url("https://evil.example/"), None);
        assert_eq!(normalize_redirect_url("//evil.example/"), None);
        assert_eq!(normalize_redirect_url("summary"), None);
    }

    #[test]
    fn rejects_sign_in_flow_urls() {
        assert_eq!(normalize_redirect_url(endpoints::SIGN_IN_VIEW), None);
        assert_eq!(normalize_redirect_url(endpoints::AUTH_CALLBACK), None);
    }

    #[test]
    fn page_request_redirects_back_to_page() {
        let request = Request::builder()
            .uri("/summary?year=2024&month=3")
            .body(Body::empty())
            .unwrap();

        let url = build_sign_in_redirect_url(&request).unwrap();

        assert_eq!(
            url,
            "/sign_in?redirect_url=%2Fsummary%3Fyear%3D2024%26month%3D3"
        );
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        let request = Request::builder()
            .uri(endpoints::EXPENSES_API)
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_sign_in_redirect_url(&request), None);
    }
}
