//! Automatic expenses: expenses such as rent or subscriptions that are added
//! once a month without the user entering them.

mod create;
mod db;
mod domain;
mod reconcile;
mod remove;
mod skip;

pub use create::{create_automatic_expense_endpoint, get_new_automatic_expense_page};
pub use db::{
    create_automatic_expense, create_automatic_expense_tables, list_active_automatic_expenses,
    list_automatic_expenses, remove_automatic_expense, skip_automatic_expense,
};
pub use domain::{AutomaticExpense, AutomaticExpenseName, NewAutomaticExpense};
pub use reconcile::{ReconcileReport, ensure_automatic_expenses_for_month};
pub use remove::remove_automatic_expense_endpoint;
pub use skip::skip_automatic_expense_endpoint;
