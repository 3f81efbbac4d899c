//! Defines the core data models and database queries for expenses.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{Error, auth::UserID, database_id::DatabaseId};

// ============================================================================
// MODELS
// ============================================================================

/// What an expense was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, eating out and snacks.
    Food,
    /// Rent and other housing costs.
    Rent,
    /// Commuting, fuel and trips.
    Travel,
    /// Utilities, phone, subscriptions.
    Bills,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category, in the order they are shown to the user.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Rent,
        Category::Travel,
        Category::Bills,
        Category::Other,
    ];

    /// The name of the category as shown to the user and stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Rent => "Rent",
            Category::Travel => "Travel",
            Category::Bills => "Bills",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidCategory(s.to_owned()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// Whether an expense was entered by the user or created from an automatic expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseSource {
    /// Entered by the user.
    Manual,
    /// Created by reconciling an automatic expense.
    Automatic,
}

impl ExpenseSource {
    /// The name used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseSource::Manual => "manual",
            ExpenseSource::Automatic => "automatic",
        }
    }
}

impl FromStr for ExpenseSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ExpenseSource::Manual),
            "automatic" => Ok(ExpenseSource::Automatic),
            other => Err(Error::InvalidExpenseSource(other.to_owned())),
        }
    }
}

impl ToSql for ExpenseSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ExpenseSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A calendar month, e.g. March 2024.
///
/// Written as `YYYY-MM` in URLs and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    // Field order matters for the derived ordering.
    year: i32,
    month: u8,
}

impl YearMonth {
    /// Create a year and month.
    ///
    /// # Errors
    /// Returns [Error::InvalidYearMonth] if `month` is not in 1..=12 or the
    /// year is outside the range of [Date].
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let year_month = Self { year, month };

        match Month::try_from(month)
            .ok()
            .and_then(|month| Date::from_calendar_date(year, month, 1).ok())
        {
            Some(_) => Ok(year_month),
            None => Err(Error::InvalidYearMonth(format!("{year}-{month:02}"))),
        }
    }

    /// The month that `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        // `new` and `containing` only accept months in 1..=12.
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        Date::from_calendar_date(self.year, self.month(), 1).unwrap_or(Date::MIN)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        self.next()
            .first_day()
            .previous_day()
            .unwrap_or(Date::MAX)
    }

    /// Every day of the month, first and last day included.
    pub fn date_range(&self) -> RangeInclusive<Date> {
        self.first_day()..=self.last_day()
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            1 => Self {
                year: self.year - 1,
                month: 12,
            },
            month => Self {
                year: self.year,
                month: month - 1,
            },
        }
    }

    /// The month after this one.
    pub fn next(&self) -> Self {
        match self.month {
            12 => Self {
                year: self.year + 1,
                month: 1,
            },
            month => Self {
                year: self.year,
                month: month + 1,
            },
        }
    }

    /// The month and year for headings, e.g. "March 2024".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.month(), self.year)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidYearMonth(s.to_owned());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl ToSql for YearMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for YearMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// Money spent by a user on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: DatabaseId,
    /// The user that spent the money.
    pub user_id: UserID,
    /// How much was spent, always greater than zero.
    pub amount: f64,
    /// When the money was spent.
    pub date: Date,
    /// What the money was spent on.
    pub category: Category,
    /// An optional description, e.g. "Lunch with Priya".
    pub note: Option<String>,
    /// Whether the user entered the expense or it came from an automatic expense.
    pub source: ExpenseSource,
    /// The automatic expense this expense was created from, if any.
    pub automatic_expense_id: Option<DatabaseId>,
}

/// A validated expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    amount: f64,
    date: Date,
    category: Category,
    note: Option<String>,
}

impl NewExpense {
    /// Validate the fields of a new expense.
    ///
    /// A blank `note` is treated as no note.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is not greater than zero or
    /// is more than [MAX_AMOUNT].
    pub fn new(amount: f64, date: Date, category: Category, note: Option<&str>) -> Result<Self, Error> {
        let amount = check_amount(amount)?;

        let note = note
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_owned);

        Ok(Self {
            amount,
            date,
            category,
            note,
        })
    }
}

/// The largest amount, in rupees, accepted for a single expense.
///
/// Month totals stay finite for any realistic number of expenses this size.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Check that `amount` is greater than zero and at most [MAX_AMOUNT].
///
/// # Errors
/// Returns [Error::InvalidAmount] otherwise, including for NaN and infinity.
pub fn check_amount(amount: f64) -> Result<f64, Error> {
    if amount > 0.0 && amount <= MAX_AMOUNT {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Parse an amount typed into a form, e.g. "12.50".
///
/// # Errors
/// Returns [Error::InvalidNumber] if `text` is not a number and
/// [Error::InvalidAmount] if [check_amount] rejects it.
pub fn parse_amount(text: &str) -> Result<f64, Error> {
    let amount: f64 = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidNumber(text.to_owned()))?;

    check_amount(amount)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                note TEXT,
                source TEXT NOT NULL DEFAULT 'manual',
                automatic_expense_id INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(automatic_expense_id) REFERENCES automatic_expense(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Used by the totals on the home page and the summary page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    // At most one expense per automatic expense per month.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_expense_automatic_month
            ON expense(automatic_expense_id, substr(date, 1, 7))
            WHERE automatic_expense_id IS NOT NULL;",
        (),
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        date: row.get(3)?,
        category: row.get(4)?,
        note: row.get(5)?,
        source: row.get(6)?,
        automatic_expense_id: row.get(7)?,
    })
}

const EXPENSE_COLUMNS: &str =
    "id, user_id, amount, date, category, note, source, automatic_expense_id";

/// Save a manually entered expense for `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. `user_id` does not refer to a user.
pub fn create_expense(
    user_id: UserID,
    new_expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO expense (user_id, amount, date, category, note, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                new_expense.amount,
                new_expense.date,
                new_expense.category,
                new_expense.note,
                ExpenseSource::Manual,
            ),
            map_expense_row,
        )
        .map_err(|error| error.into())
}

/// Get the user's `limit` most recent expenses, latest date first.
///
/// Expenses on the same date are ordered newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_recent_expenses(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1
             ORDER BY date DESC, id DESC
             LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the user's expenses dated within `date_range`, latest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_expenses_in_range(
    user_id: UserID,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            (user_id.as_i64(), date_range.start(), date_range.end()),
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// The sum of the user's expenses dated within `date_range`, or zero if there are none.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_total_in_range(
    user_id: UserID,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            (user_id.as_i64(), date_range.start(), date_range.end()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The sum of the user's expenses on `today`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_today_total(user_id: UserID, today: Date, connection: &Connection) -> Result<f64, Error> {
    get_total_in_range(user_id, today..=today, connection)
}

/// The sum of the user's expenses in `month`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_month_total(
    user_id: UserID,
    month: YearMonth,
    connection: &Connection,
) -> Result<f64, Error> {
    get_total_in_range(user_id, month.date_range(), connection)
}
