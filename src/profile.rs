//! User profiles: the records that own a user's income, expenses and reports.

use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row, types::Type};

use crate::{Error, auth::UserID, database_id::DatabaseId};

pub type ProfileId = DatabaseId;

/// Shown when a logged in user tries to save a record but has no profile to own it.
pub const MISSING_PROFILE_MESSAGE: &str = "User profile not found. Please contact support.";

/// The public face of a registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: ProfileId,
    pub user_id: UserID,
    /// A copy of the user's username.
    pub username: String,
    pub email: EmailAddress,
}

/// Create the user profile table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_profile (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create the profile for the user `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if another profile has `username`,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_profile(
    user_id: UserID,
    username: &str,
    email: EmailAddress,
    connection: &Connection,
) -> Result<UserProfile, Error> {
    connection.execute(
        "INSERT INTO user_profile (user_id, username, email) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), username, email.as_str()),
    )?;

    Ok(UserProfile {
        id: connection.last_insert_rowid(),
        user_id,
        username: username.to_owned(),
        email,
    })
}

/// Get the profile of the user `user_id`, or `None` if they do not have one.
pub fn find_profile_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<UserProfile>, Error> {
    connection
        .prepare("SELECT id, user_id, username, email FROM user_profile WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get every profile ordered by username.
pub fn get_all_profiles(connection: &Connection) -> Result<Vec<UserProfile>, Error> {
    connection
        .prepare("SELECT id, user_id, username, email FROM user_profile ORDER BY username ASC")?
        .query_map([], map_row)?
        .map(|maybe_profile| maybe_profile.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<UserProfile, rusqlite::Error> {
    let raw_email: String = row.get(3)?;
    let email = EmailAddress::from_str(&raw_email).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error))
    })?;

    Ok(UserProfile {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        username: row.get(2)?,
        email,
    })
}
