//! The sign-in page and the callback that turns a proxy-verified identity into a session.
//!
//! The OAuth handshake itself happens in the authenticating reverse proxy.
//! The proxy only lets a request through to [AUTH_CALLBACK](endpoints::AUTH_CALLBACK)
//! once the user has signed in with the identity provider, and it attaches the
//! verified identity as headers along with the secret shared with this app.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{EmailAddress, normalize_redirect_url, set_auth_cookie, upsert_user},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, base},
    timezone::get_local_offset,
};

/// The verified email address of the user.
pub const EMAIL_HEADER: &str = "x-forwarded-email";
/// The display name of the user.
pub const NAME_HEADER: &str = "x-forwarded-user";
/// A URL to the user's avatar.
pub const PICTURE_HEADER: &str = "x-forwarded-picture";
/// The secret shared between the proxy and the app.
pub const PROXY_SECRET_HEADER: &str = "x-auth-proxy-secret";

const SIGN_IN_FAILED_MSG: &str = "Sign in failed. Please try again.";

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

fn sign_in_view(error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    let callback_url = match redirect_url
        .and_then(|url| serde_urlencoded::to_string([("redirect_url", url)]).ok())
    {
        Some(query) => format!("{}?{}", endpoints::AUTH_CALLBACK, query),
        None => endpoints::AUTH_CALLBACK.to_owned(),
    };

    let content = html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto min-h-screen"
        {
            a href=(endpoints::HOME_VIEW) class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                img class="w-8 h-8 mr-2" src="/static/favicon-128x128.png" alt="logo";
                "Spendwise"
            }

            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        "Track every rupee"
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Log expenses in seconds, automate your monthly bills and see where your money goes."
                    }

                    @if let Some(error_message) = error_message {
                        p class=(FORM_ERROR_STYLE) { (error_message) }
                    }

                    a
                        href=(callback_url)
                        id="sign-in-link"
                        class={ "block text-center " (BUTTON_PRIMARY_STYLE) }
                    {
                        "Continue with Google"
                    }
                }
            }
        }
    };

    base("Sign In", &[], &content)
}

/// Display the sign-in page.
pub async fn get_sign_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "sign-in query");

    sign_in_view(None, redirect_url.as_deref()).into_response()
}

/// The state needed to complete a sign-in.
#[derive(Debug, Clone)]
pub struct SignInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which sessions are valid.
    pub cookie_duration: Duration,
    /// The SHA-512 digest of the secret the proxy must present.
    pub proxy_secret_digest: Vec<u8>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SignInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            proxy_secret_digest: state.proxy_secret_digest.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignInState> for Key {
    fn from_ref(state: &SignInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The identity forwarded by the authenticating proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyIdentity {
    pub email: EmailAddress,
    pub name: Option<String>,
    pub image: Option<String>,
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Check that the request came through the authenticating proxy and read the
/// identity it forwarded.
///
/// # Errors
///
/// Returns:
/// - [Error::UntrustedProxy] if the shared secret is missing or wrong.
/// - [Error::InvalidIdentity] if the email address is missing or malformed.
pub fn identity_from_headers(
    headers: &HeaderMap,
    proxy_secret_digest: &[u8],
) -> Result<ProxyIdentity, Error> {
    let presented_secret = header_value(headers, PROXY_SECRET_HEADER).ok_or(Error::UntrustedProxy)?;

    if Sha512::digest(presented_secret).as_slice() != proxy_secret_digest {
        return Err(Error::UntrustedProxy);
    }

    let email = header_value(headers, EMAIL_HEADER)
        .ok_or_else(|| Error::InvalidIdentity(format!("missing {EMAIL_HEADER} header")))?;

    Ok(ProxyIdentity {
        email: EmailAddress::new(email)?,
        name: header_value(headers, NAME_HEADER).map(str::to_owned),
        image: header_value(headers, PICTURE_HEADER).map(str::to_owned),
    })
}

/// Handler for the sign-in callback.
///
/// On success the user is created or updated, the session cookie is set and
/// the client is redirected to `redirect_url` or the home page.
/// Otherwise the sign-in page is shown again with an error message.
pub async fn get_auth_callback(
    State(state): State<SignInState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "sign-in callback");
    let sign_in_failed = |status: StatusCode| {
        (status, sign_in_view(Some(SIGN_IN_FAILED_MSG), redirect_url.as_deref())).into_response()
    };

    let identity = match identity_from_headers(&headers, &state.proxy_secret_digest) {
        Ok(identity) => identity,
        Err(Error::UntrustedProxy) => {
            tracing::warn!("Rejected sign-in that did not come through the authentication proxy");
            return sign_in_failed(StatusCode::FORBIDDEN);
        }
        Err(error) => {
            tracing::warn!("Rejected sign-in with an invalid identity: {error}");
            return sign_in_failed(StatusCode::BAD_REQUEST);
        }
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return sign_in_failed(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        match upsert_user(
            &identity.email,
            identity.name.as_deref(),
            identity.image.as_deref(),
            &connection,
        ) {
            Ok(user) => user,
            Err(error) => {
                tracing::error!("Could not save user {}: {error}", identity.email);
                return sign_in_failed(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => {
            tracing::info!("User {} signed in", user.id);
            let redirect_url = redirect_url.as_deref().unwrap_or(endpoints::HOME_VIEW);

            (jar, Redirect::to(redirect_url)).into_response()
        }
        Err(error) => {
            tracing::error!("Error setting session cookie: {error}");
            sign_in_failed(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}


#[cfg(test)]
mod auth_callback_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::{HeaderMap, HeaderValue, StatusCode},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use rusqlite::Connection;
    use time::Duration;

    use crate::{
        Error,
        app_state::{create_cookie_key, digest_secret},
        auth::{COOKIE_TOKEN, UserID, get_user_by_id},
        db::initialize,
        endpoints,
    };

    use super::{
        EMAIL_HEADER, NAME_HEADER, PROXY_SECRET_HEADER, RedirectQuery, SignInState,
        get_auth_callback, identity_from_headers,
    };

    const PROXY_SECRET: &str = "correct-horse-battery-staple";

    fn get_state() -> SignInState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SignInState {
            cookie_key: create_cookie_key("a test secret that is long enough"),
            cookie_duration: Duration::days(30),
            proxy_secret_digest: digest_secret(PROXY_SECRET),
            local_timezone: "Asia/Kolkata".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn proxy_headers(secret: &str, email: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(PROXY_SECRET_HEADER, HeaderValue::from_str(secret).unwrap());
        headers.insert(EMAIL_HEADER, HeaderValue::from_str(email).unwrap());
        headers.insert(NAME_HEADER, HeaderValue::from_static("Asha"));
        headers
    }

    fn session_cookie_value(response: &axum::response::Response) -> Option<String> {
        response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| Cookie::parse(value.to_str().ok()?.to_owned()).ok())
            .find(|cookie| cookie.name() == COOKIE_TOKEN)
            .map(|cookie| cookie.value().to_owned())
    }

    #[test]
    fn reads_identity_from_trusted_proxy() {
        let headers = proxy_headers(PROXY_SECRET, "Asha@Example.com");

        let identity = identity_from_headers(&headers, &digest_secret(PROXY_SECRET)).unwrap();

        assert_eq!(identity.email.as_str(), "asha@example.com");
        assert_eq!(identity.name.as_deref(), Some("Asha"));
        assert_eq!(identity.image, None);
    }

    #[test]
    fn rejects_wrong_proxy_secret() {
        let headers = proxy_headers("not-the-secret", "asha@example.com");

        assert_eq!(
            identity_from_headers(&headers, &digest_secret(PROXY_SECRET)),
            Err(Error::UntrustedProxy)
        );
    }

    #[test]
    fn rejects_missing_email() {
        let mut headers = HeaderMap::new();
        headers.insert(PROXY_SECRET_HEADER, HeaderValue::from_static(PROXY_SECRET));

        assert!(matches!(
            identity_from_headers(&headers, &digest_secret(PROXY_SECRET)),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[tokio::test]
    async fn callback_creates_user_and_sets_session() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_auth_callback(
            State(state.clone()),
            jar,
            proxy_headers(PROXY_SECRET, "asha@example.com"),
            Query(RedirectQuery {
                redirect_url: Some("/summary".to_owned()),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/summary");
        assert!(session_cookie_value(&response).is_some());
        let user = get_user_by_id(UserID::new(1), &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(user.email, "asha@example.com");
    }

    #[tokio::test]
    async fn callback_defaults_to_home() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_auth_callback(
            State(state),
            jar,
            proxy_headers(PROXY_SECRET, "asha@example.com"),
            Query(RedirectQuery { redirect_url: None }),
        )
        .await;

        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::HOME_VIEW
        );
    }

    #[tokio::test]
    async fn callback_rejects_untrusted_request() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_auth_callback(
            State(state.clone()),
            jar,
            proxy_headers("forged", "asha@example.com"),
            Query(RedirectQuery { redirect_url: None }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(session_cookie_value(&response).is_none());
        let count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
