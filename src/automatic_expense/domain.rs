//! Core automatic expense domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    expense::{Category, YearMonth, check_amount},
};

/// A validated, non-empty automatic expense name, e.g. "Rent" or "Netflix".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AutomaticExpenseName(String);

impl AutomaticExpenseName {
    /// Create an automatic expense name.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyAutomaticExpenseName] if
    /// `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyAutomaticExpenseName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create an automatic expense name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for AutomaticExpenseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AutomaticExpenseName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutomaticExpenseName::new(s)
    }
}

impl Display for AutomaticExpenseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated automatic expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAutomaticExpense {
    pub(super) name: AutomaticExpenseName,
    pub(super) amount: f64,
    pub(super) category: Category,
}

impl NewAutomaticExpense {
    /// Validate the fields of a new automatic expense.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is not greater than zero
    /// or is more than [crate::expense::MAX_AMOUNT].
    pub fn new(name: AutomaticExpenseName, amount: f64, category: Category) -> Result<Self, Error> {
        let amount = check_amount(amount)?;

        Ok(Self {
            name,
            amount,
            category,
        })
    }
}

/// An expense that is added automatically at the start of every month,
/// e.g. rent or a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomaticExpense {
    pub id: DatabaseId,
    pub user_id: UserID,
    pub name: AutomaticExpenseName,
    pub amount: f64,
    pub category: Category,
    /// The first month an expense is added for.
    pub start_month: YearMonth,
    /// Removed automatic expenses stay in the database with this set to false.
    pub is_active: bool,
}

#[cfg(test)]
mod automatic_expense_name_tests {
    use crate::{
        Error,
        expense::{Category, MAX_AMOUNT},
    };

    use super::{AutomaticExpenseName, NewAutomaticExpense};

    #[test]
    fn trims_name() {
        let name = AutomaticExpenseName::new("  Netflix ").unwrap();

        assert_eq!(name.as_ref(), "Netflix");
    }

    #[test]
    fn rejects_blank_name() {
        assert_eq!(
            AutomaticExpenseName::new("   "),
            Err(Error::EmptyAutomaticExpenseName)
        );
    }

    #[test]
    fn rejects_amount_over_the_limit() {
        let name = AutomaticExpenseName::new("Rent").unwrap();

        assert_eq!(
            NewAutomaticExpense::new(name, 1e308, Category::Rent),
            Err(Error::InvalidAmount(1e308))
        );
    }

    #[test]
    fn accepts_the_largest_amount() {
        let name = AutomaticExpenseName::new("Rent").unwrap();

        assert!(NewAutomaticExpense::new(name, MAX_AMOUNT, Category::Rent).is_ok());
    }
}
