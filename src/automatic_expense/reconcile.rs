//! Adds the expenses for a user's automatic expenses for a month.
//!
//! Runs whenever the home page is loaded rather than on a schedule, so it must
//! be safe to run any number of times for the same month.

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    automatic_expense::db::{is_month_skipped, list_active_automatic_expenses},
    expense::{ExpenseSource, YearMonth},
};

/// What a reconciliation run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The number of expenses added.
    pub created: usize,
    /// The number of automatic expenses that were skipped for the month.
    pub skipped: usize,
}

/// Make sure each of the user's active automatic expenses has exactly one
/// expense in `month`, unless it was skipped for that month or starts later.
///
/// New expenses are dated the first of the month, copy the amount and
/// category of the automatic expense and use its name as the note. The whole
/// run happens in one transaction, so an error leaves the database untouched.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn ensure_automatic_expenses_for_month(
    user_id: UserID,
    month: YearMonth,
    connection: &Connection,
) -> Result<ReconcileReport, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut report = ReconcileReport::default();
    let date_range = month.date_range();

    for automatic_expense in list_active_automatic_expenses(user_id, &transaction)? {
        if automatic_expense.start_month > month {
            continue;
        }

        if is_month_skipped(automatic_expense.id, month, &transaction)? {
            report.skipped += 1;
            continue;
        }

        let already_added: bool = transaction.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM expense
                WHERE user_id = ?1 AND automatic_expense_id = ?2 AND date BETWEEN ?3 AND ?4
            )",
            (
                user_id.as_i64(),
                automatic_expense.id,
                date_range.start(),
                date_range.end(),
            ),
            |row| row.get(0),
        )?;

        if already_added {
            continue;
        }

        // OR IGNORE absorbs a concurrent run that inserted the same month first.
        report.created += transaction.execute(
            "INSERT OR IGNORE INTO expense
                (user_id, amount, date, category, note, source, automatic_expense_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                user_id.as_i64(),
                automatic_expense.amount,
                month.first_day(),
                automatic_expense.category,
                automatic_expense.name.as_ref(),
                ExpenseSource::Automatic,
                automatic_expense.id,
            ),
        )?;
    }

    transaction.commit()?;

    tracing::debug!(
        "Reconciled automatic expenses for user {user_id} in {month}: {} created, {} skipped",
        report.created,
        report.skipped
    );

    Ok(report)
}
