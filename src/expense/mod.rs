//! Manually entered expenses, the totals shown on the home page and the
//! page for adding an expense.

mod add_endpoint;
mod add_page;
mod core;

pub use add_endpoint::add_expense_endpoint;
pub use add_page::get_add_expense_page;
pub use core::{
    Category, Expense, ExpenseSource, MAX_AMOUNT, NewExpense, YearMonth, check_amount,
    create_expense, create_expense_table, get_expenses_in_range, get_month_total,
    get_recent_expenses, get_today_total, parse_amount,
};

pub(crate) use add_page::category_radio_group;
