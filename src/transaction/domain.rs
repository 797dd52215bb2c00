//! Core income and expense domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, Error as DecimalError, prelude::ToPrimitive};
use time::Date;

use crate::{category::CategoryId, database_id::DatabaseId, endpoints, profile::ProfileId};

/// Database identifier for an income or expense record.
pub type TransactionId = DatabaseId;

/// Income and expenses share a shape but live in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The table the records are stored in.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The page listing records of this kind.
    pub fn list_endpoint(&self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::INCOME_LIST,
            TransactionKind::Expense => endpoints::EXPENSE_LIST,
        }
    }

    /// The page for recording a new record of this kind.
    pub fn create_endpoint(&self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::CREATE_INCOME,
            TransactionKind::Expense => endpoints::CREATE_EXPENSE,
        }
    }

    /// The name of a single record, e.g. "Expense".
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// The heading for a list of records, e.g. "Expenses".
    pub fn plural_label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expenses",
        }
    }
}

/// The most digits allowed before the decimal point.
const MAX_WHOLE_DIGITS: u32 = 8;
/// The most digits allowed after the decimal point.
const MAX_DECIMAL_PLACES: u32 = 2;

/// Why a string could not be read as an [Amount].
///
/// The messages are shown to users next to the amount input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Enter a number.")]
    NotANumber,
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,
    #[error("Ensure that there are no more than 8 digits before the decimal point.")]
    TooManyWholeDigits,
}

/// An exact amount of money with two decimal places.
///
/// Stored in the database as an integer number of cents so that sums are exact.
/// The sign is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero, the total of no records.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MAX_DECIMAL_PLACES))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or_default()
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `from_str` rounds past 28 fractional digits, which would hide extra places.
        let mut value = Decimal::from_str_exact(s.trim()).map_err(|error| match error {
            DecimalError::Underflow | DecimalError::ScaleExceedsMaximumPrecision(_) => {
                AmountError::TooManyDecimalPlaces
            }
            DecimalError::ExceedsMaximumPossibleValue
            | DecimalError::LessThanMinimumPossibleValue => AmountError::TooManyWholeDigits,
            _ => AmountError::NotANumber,
        })?;

        if value.normalize().scale() > MAX_DECIMAL_PLACES {
            return Err(AmountError::TooManyDecimalPlaces);
        }

        if value.trunc().abs() >= Decimal::from(10_i64.pow(MAX_WHOLE_DIGITS)) {
            return Err(AmountError::TooManyWholeDigits);
        }

        value.rescale(MAX_DECIMAL_PLACES);

        Ok(Self(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut value = self.0;
        value.rescale(MAX_DECIMAL_PLACES);

        write!(f, "{value}")
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(Amount::from_cents)
    }
}

/// A validated income or expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Amount,
    pub category_id: CategoryId,
    pub date: Date,
}

/// A saved income or expense, as shown in the lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub profile_id: ProfileId,
    pub amount: Amount,
    pub category_id: CategoryId,
    /// The name of the category at the time of reading.
    pub category_name: String,
    pub date: Date,
}
