//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/automatic_expenses/{automatic_expense_id}',
//! use [format_endpoint].

/// The home page: today's total, this month's total, recent expenses and automatic expenses.
pub const HOME_VIEW: &str = "/";
/// The page for adding a new expense.
pub const ADD_EXPENSE_VIEW: &str = "/add";
/// The page for setting up a new automatic expense.
pub const NEW_AUTOMATIC_EXPENSE_VIEW: &str = "/automatic_expenses/new";
/// The page showing the per-category breakdown of a month.
pub const SUMMARY_VIEW: &str = "/summary";
/// The route for getting the sign-in page.
pub const SIGN_IN_VIEW: &str = "/sign_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route the authenticating proxy sends the user to after a successful sign-in.
pub const AUTH_CALLBACK: &str = "/api/auth/callback";
/// The route for the client to sign out the current user.
pub const SIGN_OUT: &str = "/api/sign_out";
/// The route to create an expense.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to create an automatic expense.
pub const AUTOMATIC_EXPENSES_API: &str = "/api/automatic_expenses";
/// The route to remove an automatic expense.
pub const AUTOMATIC_EXPENSE: &str = "/api/automatic_expenses/{automatic_expense_id}";
/// The route to skip an automatic expense for the current month.
pub const SKIP_AUTOMATIC_EXPENSE: &str = "/api/automatic_expenses/{automatic_expense_id}/skip";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
