//! Guards that only let requests with a valid session through to the app.
//!
//! A session is valid when the cookie decrypts, has not expired and names a
//! user that is still in the database. Each request through a guard pushes
//! the session expiry back, so active users stay signed in.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::{Duration, UtcOffset};

use crate::{
    AppState, Error,
    auth::{
        UserID,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        get_user_by_id,
        redirect::{build_sign_in_redirect_url, build_sign_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which sessions are valid after the latest request.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// Used to check that the user behind a session still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Where to send a user who is not signed in, falling back to the sign-in
/// page that returns to the home page.
fn sign_in_target(request: &Request) -> String {
    build_sign_in_redirect_url(request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!("Missing or invalid HTMX headers for /api request. Falling back to home.");
        } else {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to home.");
        }

        build_sign_in_redirect_url_from_target(endpoints::HOME_VIEW)
            .unwrap_or_else(|| endpoints::SIGN_IN_VIEW.to_owned())
    })
}

/// Find the signed-in user for the request.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] or [Error::InvalidToken] if there is no valid session.
/// - [Error::InvalidToken] if the user in the session has been deleted.
/// - [Error::DatabaseLockError] or [Error::SqlError] if the user could not be looked up.
async fn authenticate(
    state: &AuthState,
    parts: &mut Parts,
) -> Result<(UserID, PrivateCookieJar), Error> {
    let jar = PrivateCookieJar::from_request_parts(parts, state)
        .await
        .map_err(|error| Error::InvalidToken(format!("{error:?}")))?;
    let user_id = get_token_from_cookies(&jar)?.user_id;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(_) => Ok((user_id, jar)),
        Err(Error::NotFound) => Err(Error::InvalidToken(format!(
            "user {user_id} no longer exists"
        ))),
        Err(error) => Err(error),
    }
}

/// Copy the refreshed session cookie onto `response`.
///
/// The old cookie is kept if the session cannot be extended.
fn refresh_session(
    response: Response,
    jar: PrivateCookieJar,
    cookie_duration: Duration,
    local_offset: UtcOffset,
) -> Response {
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), cookie_duration, local_offset)
    {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending session: {error}. Rolling back cookie jar.");
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    for value in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Run `request` as the signed-in user, or answer with `redirect` to the
/// sign-in page.
async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect: fn(&str) -> Response,
) -> Response {
    let sign_in_url = sign_in_target(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Could not get the offset for timezone {}. Redirecting to sign in page.",
            state.local_timezone
        );
        return redirect(&sign_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let (user_id, jar) = match authenticate(&state, &mut parts).await {
        Ok(session) => session,
        Err(error @ (Error::DatabaseLockError | Error::SqlError(_))) => {
            tracing::error!("Could not check session: {error}");
            return error.into_response();
        }
        Err(error) => {
            tracing::debug!("No valid session: {error}. Redirecting to sign in page.");
            return redirect(&sign_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    refresh_session(response, jar, state.cookie_duration, local_offset)
}

/// Middleware for pages that need a signed-in user.
///
/// Without a valid session the browser is redirected to the sign-in page,
/// which sends the user back to the requested page afterwards.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, |url| Redirect::to(url).into_response()).await
}

/// Middleware for the HTMX API routes.
///
/// Same as [auth_guard], except the redirect is sent with the `HX-Redirect`
/// header so that HTMX loads the sign-in page instead of swapping it into the
/// current page.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, |url| {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}
