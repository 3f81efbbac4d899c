//! User identity and sessions.
//!
//! Users sign in through an authenticating reverse proxy; this module turns
//! the identity it forwards into a user row and a session cookie, and guards
//! the rest of the app behind that session.

mod cookie;
mod middleware;
mod redirect;
mod sign_in;
mod sign_out;
mod token;
mod user;

pub use cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use redirect::normalize_redirect_url;
pub use sign_in::{PROXY_SECRET_HEADER, get_auth_callback, get_sign_in_page};
pub use sign_out::get_sign_out;
pub use user::{EmailAddress, User, UserID, create_user_table, get_user_by_id, upsert_user};
