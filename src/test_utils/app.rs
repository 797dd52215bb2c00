use std::str::FromStr;

use axum::{http::header::SET_COOKIE, response::IntoResponse};
use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppState,
    auth::{
        DEFAULT_COOKIE_DURATION, PasswordHash, User, UserID, ValidatedPassword, create_user,
        set_auth_cookie,
    },
    profile::{UserProfile, create_profile},
};

/// The password of every user made by [create_test_user].
pub(crate) const TEST_PASSWORD: &str = "averysecurepassword!!1";

/// App state backed by a fresh in-memory database.
pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "nafstenoas", "Etc/UTC").expect("Could not create app state")
}

/// Create a user with the password [TEST_PASSWORD] but no profile.
pub(crate) fn create_test_user_without_profile(state: &AppState, username: &str) -> User {
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("Could not hash test password");
    let connection = state.db_connection.lock().unwrap();

    create_user(username, password_hash, &connection).expect("Could not create test user")
}

/// Create a user with the password [TEST_PASSWORD] and a profile.
pub(crate) fn create_test_user(state: &AppState, username: &str) -> (User, UserProfile) {
    let user = create_test_user_without_profile(state, username);
    let email = EmailAddress::from_str(&format!("{username}@example.com"))
        .expect("Could not create test email");
    let connection = state.db_connection.lock().unwrap();
    let profile =
        create_profile(user.id, username, email, &connection).expect("Could not create profile");

    (user, profile)
}

/// An encrypted session cookie for `user_id` that the server in `state` will accept.
pub(crate) fn auth_cookie(state: &AppState, user_id: UserID) -> Cookie<'static> {
    let jar = PrivateCookieJar::new(state.cookie_key.clone());
    let jar = set_auth_cookie(jar, user_id, DEFAULT_COOKIE_DURATION)
        .expect("Could not set auth cookie");
    let response = jar.into_response();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .expect("No cookie set")
        .to_str()
        .expect("Could not convert cookie to str")
        .to_owned();

    Cookie::parse(set_cookie).expect("Could not parse cookie")
}
