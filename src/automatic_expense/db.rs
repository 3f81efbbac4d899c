//! Database operations for automatic expenses and their skipped months.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    automatic_expense::{AutomaticExpense, AutomaticExpenseName, NewAutomaticExpense},
    database_id::DatabaseId,
    expense::YearMonth,
};

/// Initialize the automatic expense and skipped month tables and their indexes.
pub fn create_automatic_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS automatic_expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            amount REAL NOT NULL CHECK (amount > 0),
            category TEXT NOT NULL,
            start_month TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_automatic_expense_user
            ON automatic_expense(user_id, is_active);

        CREATE TABLE IF NOT EXISTS skipped_automatic_expense (
            id INTEGER PRIMARY KEY,
            automatic_expense_id INTEGER NOT NULL,
            year_month TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(automatic_expense_id, year_month),
            FOREIGN KEY(automatic_expense_id) REFERENCES automatic_expense(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<AutomaticExpense, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(AutomaticExpense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: AutomaticExpenseName::new_unchecked(&raw_name),
        amount: row.get(3)?,
        category: row.get(4)?,
        start_month: row.get(5)?,
        is_active: row.get(6)?,
    })
}

/// Save a new, active automatic expense for `user_id` that starts in `start_month`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. `user_id` does not refer to a user.
pub fn create_automatic_expense(
    user_id: UserID,
    new_automatic_expense: NewAutomaticExpense,
    start_month: YearMonth,
    connection: &Connection,
) -> Result<AutomaticExpense, Error> {
    connection
        .prepare(
            "INSERT INTO automatic_expense (user_id, name, amount, category, start_month, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)
             RETURNING id, user_id, name, amount, category, start_month, is_active",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_automatic_expense.name.as_ref(),
                new_automatic_expense.amount,
                new_automatic_expense.category,
                start_month,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Get all of the user's automatic expenses, removed ones included, newest first.
pub fn list_automatic_expenses(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<AutomaticExpense>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, amount, category, start_month, is_active
             FROM automatic_expense
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_automatic_expense| maybe_automatic_expense.map_err(|error| error.into()))
        .collect()
}

/// Get the user's automatic expenses that have not been removed, newest first.
pub fn list_active_automatic_expenses(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<AutomaticExpense>, Error> {
    Ok(list_automatic_expenses(user_id, connection)?
        .into_iter()
        .filter(|automatic_expense| automatic_expense.is_active)
        .collect())
}

/// Stop `automatic_expense_id` from being added in `month` and delete the
/// expense already added for that month, if any.
///
/// Skipping the same month twice has no further effect.
///
/// # Errors
/// Returns [Error::SkipMissingAutomaticExpense] if the automatic expense does
/// not exist or belongs to another user, or [Error::SqlError] if there is an
/// SQL error.
pub fn skip_automatic_expense(
    user_id: UserID,
    automatic_expense_id: DatabaseId,
    month: YearMonth,
    connection: &Connection,
) -> Result<(), Error> {
    let owned_id = connection
        .prepare("SELECT id FROM automatic_expense WHERE id = ?1 AND user_id = ?2")?
        .query_row((automatic_expense_id, user_id.as_i64()), |row| {
            row.get::<_, DatabaseId>(0)
        })
        .map_err(Error::from);

    match owned_id {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::SkipMissingAutomaticExpense),
        Err(error) => return Err(error),
    }

    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "INSERT INTO skipped_automatic_expense (automatic_expense_id, year_month)
         VALUES (?1, ?2)
         ON CONFLICT(automatic_expense_id, year_month) DO NOTHING",
        (automatic_expense_id, month),
    )?;

    let date_range = month.date_range();
    let deleted = transaction.execute(
        "DELETE FROM expense
         WHERE user_id = ?1 AND automatic_expense_id = ?2 AND date BETWEEN ?3 AND ?4",
        (
            user_id.as_i64(),
            automatic_expense_id,
            date_range.start(),
            date_range.end(),
        ),
    )?;

    transaction.commit()?;

    tracing::debug!(
        "Skipped automatic expense {automatic_expense_id} for {month}, deleted {deleted} expense(s)"
    );

    Ok(())
}

/// Whether `automatic_expense_id` has been skipped for `month`.
pub fn is_month_skipped(
    automatic_expense_id: DatabaseId,
    month: YearMonth,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (
                SELECT 1 FROM skipped_automatic_expense
                WHERE automatic_expense_id = ?1 AND year_month = ?2
            )",
            (automatic_expense_id, month),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Stop adding `automatic_expense_id` in future months.
///
/// Expenses that were already added are kept. Removing an automatic expense
/// twice has no further effect.
///
/// # Errors
/// Returns [Error::RemoveMissingAutomaticExpense] if the automatic expense does
/// not exist or belongs to another user, or [Error::SqlError] if there is an
/// SQL error.
pub fn remove_automatic_expense(
    user_id: UserID,
    automatic_expense_id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE automatic_expense SET is_active = 0 WHERE id = ?1 AND user_id = ?2",
        (automatic_expense_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::RemoveMissingAutomaticExpense);
    }

    Ok(())
}
