//! Database operations for reports.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{Error, database_id::DatabaseId, profile::ProfileId};

/// Database identifier for a report.
pub type ReportId = DatabaseId;

/// A date range saved by a user.
///
/// The range is not checked for order and is not used to scope the totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: ReportId,
    pub profile_id: ProfileId,
    pub start_date: Date,
    pub end_date: Date,
}

/// Save a report for `profile_id`.
pub fn create_report(
    profile_id: ProfileId,
    start_date: Date,
    end_date: Date,
    connection: &Connection,
) -> Result<Report, Error> {
    connection.execute(
        "INSERT INTO report (profile_id, start_date, end_date) VALUES (?1, ?2, ?3)",
        (profile_id, start_date, end_date),
    )?;

    Ok(Report {
        id: connection.last_insert_rowid(),
        profile_id,
        start_date,
        end_date,
    })
}

/// Get the reports saved by `profile_id`, most recent first.
pub fn get_reports_for_profile(
    profile_id: ProfileId,
    connection: &Connection,
) -> Result<Vec<Report>, Error> {
    connection
        .prepare(
            "SELECT id, profile_id, start_date, end_date FROM report
            WHERE profile_id = :profile_id ORDER BY id DESC",
        )?
        .query_map(&[(":profile_id", &profile_id)], map_row)?
        .map(|maybe_report| maybe_report.map_err(|error| error.into()))
        .collect()
}

/// Create the report table.
pub fn create_report_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS report (
                id INTEGER PRIMARY KEY,
                profile_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                FOREIGN KEY(profile_id) REFERENCES user_profile(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Report, rusqlite::Error> {
    Ok(Report {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
    })
}
