//! Groups a month's expenses by category for the summary page.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    expense::{Category, Expense, YearMonth, get_expenses_in_range},
};

/// How much was spent on one category in a month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
    /// The share of the month's total, from 0 to 100.
    pub percentage: f64,
}

/// The spending for one month, broken down by category.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total: f64,
    /// Categories that have expenses, largest amount first.
    pub breakdown: Vec<CategoryTotal>,
    /// A one line description of where the money went.
    pub insight: String,
}

/// Summarize `expenses`, which should all fall in `month`.
pub(super) fn summarize(month: YearMonth, expenses: &[Expense]) -> MonthlySummary {
    let mut totals: HashMap<Category, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }

    let total: f64 = totals.values().sum();

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category,
            amount,
            percentage: if total > 0.0 {
                amount / total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    // Ties fall back to the display order of the categories.
    breakdown.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    let insight = insight_text(&breakdown);

    MonthlySummary {
        month,
        total,
        breakdown,
        insight,
    }
}

fn insight_text(breakdown: &[CategoryTotal]) -> String {
    match breakdown.first() {
        Some(top) => format!("Most spent on {} (₹{:.2})", top.category, top.amount),
        None => "No expenses this month.".to_owned(),
    }
}

/// Get the summary of the user's expenses in `month`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_monthly_summary(
    user_id: UserID,
    month: YearMonth,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let expenses = get_expenses_in_range(user_id, month.date_range(), connection)?;

    Ok(summarize(month, &expenses))
}


#[cfg(test)]
mod get_monthly_summary_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        auth::{EmailAddress, upsert_user},
        db::initialize,
        expense::{Category, MAX_AMOUNT, NewExpense, YearMonth, create_expense},
    };

    use super::get_monthly_summary;

    #[test]
    fn only_counts_expenses_in_month() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = upsert_user(
            &EmailAddress::new("test@example.com").unwrap(),
            None,
            None,
            &connection,
        )
        .unwrap()
        .id;
        for (amount, date) in [
            (100.0, date!(2024 - 02 - 29)),
            (40.0, date!(2024 - 03 - 01)),
            (60.0, date!(2024 - 03 - 31)),
            (100.0, date!(2024 - 04 - 01)),
        ] {
            let new_expense = NewExpense::new(amount, date, Category::Food, None).unwrap();
            create_expense(user_id, new_expense, &connection).unwrap();
        }

        let summary =
            get_monthly_summary(user_id, YearMonth::new(2024, 3).unwrap(), &connection).unwrap();

        assert_eq!(summary.total, 100.0);
        assert_eq!(summary.breakdown.len(), 1);
        assert_eq!(summary.breakdown[0].percentage, 100.0);
    }

    #[test]
    fn largest_amounts_keep_percentages_whole() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = upsert_user(
            &EmailAddress::new("test@example.com").unwrap(),
            None,
            None,
            &connection,
        )
        .unwrap()
        .id;
        for category in [Category::Food, Category::Rent] {
            let new_expense =
                NewExpense::new(MAX_AMOUNT, date!(2024 - 03 - 10), category, None).unwrap();
            create_expense(user_id, new_expense, &connection).unwrap();
        }

        let summary =
            get_monthly_summary(user_id, YearMonth::new(2024, 3).unwrap(), &connection).unwrap();

        assert!(summary.total.is_finite());
        let percentage_sum: f64 = summary.breakdown.iter().map(|total| total.percentage).sum();
        assert!(
            (percentage_sum - 100.0).abs() < 1e-9,
            "want percentages to sum to 100, got {percentage_sum}"
        );
    }
}
