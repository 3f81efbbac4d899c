//! Sets up the SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    auth::create_user_table, automatic_expense::create_automatic_expense_tables,
    expense::create_expense_table,
};

/// Create the tables and indexes for every feature, if they do not exist yet.
///
/// Also turns on foreign key enforcement, which SQLite leaves off by default
/// and which applies to the connection rather than the database file.
///
/// # Errors
/// Returns an error if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_automatic_expense_tables(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
