//! Database operations for income and expenses.

use rusqlite::{Connection, Row, ToSql, ffi};

use crate::{
    Error,
    date_range::DateRange,
    profile::ProfileId,
    transaction::{Amount, NewTransaction, Transaction, TransactionId, TransactionKind},
};

/// Save `new_transaction` as a record of `kind` owned by `profile_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidCategory] if the category does not exist,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_transaction(
    kind: TransactionKind,
    profile_id: ProfileId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    connection
        .execute(
            &format!(
                "INSERT INTO {} (profile_id, amount, category_id, date) VALUES (?1, ?2, ?3, ?4)",
                kind.table()
            ),
            (
                profile_id,
                new_transaction.amount,
                new_transaction.category_id,
                new_transaction.date,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                ffi::Error {
                    extended_code: ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                    ..
                },
                _,
            ) => Error::InvalidCategory,
            error => error.into(),
        })?;

    Ok(connection.last_insert_rowid())
}

/// Get the records of `kind` owned by `profile_id`, newest first.
///
/// If `date_range` is given, only records dated within it (inclusive) are returned.
pub fn get_transactions(
    kind: TransactionKind,
    profile_id: ProfileId,
    date_range: Option<DateRange>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let table = kind.table();
    let mut query = format!(
        "SELECT t.id, t.profile_id, t.amount, t.category_id, c.name, t.date
        FROM {table} t INNER JOIN category c ON c.id = t.category_id
        WHERE t.profile_id = ?1"
    );
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(profile_id)];

    if let Some(range) = date_range {
        query.push_str(" AND t.date BETWEEN ?2 AND ?3");
        params.push(Box::new(range.start));
        params.push(Box::new(range.end));
    }

    query.push_str(" ORDER BY t.date DESC, t.id DESC");

    connection
        .prepare(&query)?
        .query_map(rusqlite::params_from_iter(params.iter()), map_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// The sum of every record of `kind` owned by `profile_id`, or zero if there are none.
pub fn get_total(
    kind: TransactionKind,
    profile_id: ProfileId,
    connection: &Connection,
) -> Result<Amount, Error> {
    connection
        .query_row(
            &format!(
                "SELECT COALESCE(SUM(amount), 0) FROM {} WHERE profile_id = ?1",
                kind.table()
            ),
            (profile_id,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the income and expense tables.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        let table = kind.table();

        connection.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY,
                profile_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                FOREIGN KEY(profile_id) REFERENCES user_profile(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_profile_date ON {table}(profile_id, date);"
        ))?;
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        amount: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        date: row.get(5)?,
    })
}
