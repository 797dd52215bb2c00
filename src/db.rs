//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    auth::create_user_table, category::create_category_table, profile::create_profile_table,
    report::create_report_table, transaction::create_transaction_tables,
};

/// Create all of the application's tables if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`, which SQLite
/// leaves off by default.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_tables(&transaction)?;
    create_report_table(&transaction)?;

    transaction.commit()
}
