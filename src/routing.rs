//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_auth_callback, get_sign_in_page, get_sign_out},
    automatic_expense::{
        create_automatic_expense_endpoint, get_new_automatic_expense_page,
        remove_automatic_expense_endpoint, skip_automatic_expense_endpoint,
    },
    endpoints,
    expense::{add_expense_endpoint, get_add_expense_page},
    home::get_home_page,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    summary::get_summary_page,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::SIGN_IN_VIEW, get(get_sign_in_page))
        .route(endpoints::AUTH_CALLBACK, get(get_auth_callback))
        .route(endpoints::SIGN_OUT, get(get_sign_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::HOME_VIEW, get(get_home_page))
        .route(endpoints::ADD_EXPENSE_VIEW, get(get_add_expense_page))
        .route(
            endpoints::NEW_AUTOMATIC_EXPENSE_VIEW,
            get(get_new_automatic_expense_page),
        )
        .route(endpoints::SUMMARY_VIEW, get(get_summary_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are called by HTMX and need the HX-Redirect header for auth redirects to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::EXPENSES_API, post(add_expense_endpoint))
            .route(
                endpoints::AUTOMATIC_EXPENSES_API,
                post(create_automatic_expense_endpoint),
            )
            .route(
                endpoints::SKIP_AUTOMATIC_EXPENSE,
                post(skip_automatic_expense_endpoint),
            )
            .route(
                endpoints::AUTOMATIC_EXPENSE,
                delete(remove_automatic_expense_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
