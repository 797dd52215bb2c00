//! The registration page for creating a new account.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRequest;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    auth::{PasswordHash, Session, UserID, ValidatedPassword, create_user, set_auth_cookie},
    endpoints,
    html::{
        base, form_input, form_response, link, log_in_register, post_form, redirect,
        submit_button,
    },
    internal_server_error::InternalServerError,
    profile::create_profile,
    validation::{FieldErrors, required},
};

const USERNAME_MIN_LENGTH: usize = 4;
const USERNAME_MAX_LENGTH: usize = 150;

const USERNAME_TOO_SHORT_MSG: &str = "Username must be at least 4 characters long.";
const USERNAME_TOO_LONG_MSG: &str = "Ensure this value has at most 150 characters.";
const USERNAME_INVALID_MSG: &str = "Enter a valid username. This value may contain only \
    letters, numbers, and @/./+/-/_ characters.";
const DUPLICATE_USERNAME_MSG: &str = "A user with that username already exists.";
const INVALID_EMAIL_MSG: &str = "Enter a valid email address.";
const PASSWORD_MISMATCH_MSG: &str = "The two password fields didn't match.";

#[cfg(not(test))]
const HASH_COST: u32 = PasswordHash::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

fn registration_form(form: &RegisterForm, errors: &FieldErrors) -> Markup {
    let body = html! {
        (form_input("username", "Username", "text", &form.username, errors.get("username")))
        (form_input("email", "Email", "email", &form.email, errors.get("email")))
        (form_input("password", "Password", "password", "", errors.get("password")))
        (form_input(
            "confirm_password",
            "Confirm Password",
            "password",
            "",
            errors.get("confirm_password"),
        ))

        (submit_button("Create Account"))

        p class="text-sm font-light text-gray-500 dark:text-gray-400"
        {
            "Already have an account? "
            (link(endpoints::LOG_IN, "Log in here"))
        }
    };

    post_form(endpoints::REGISTRATION, body)
}

fn registration_page(form: Markup) -> Markup {
    base("Register", &log_in_register("Create an account", &form))
}

/// Display the registration page, or send a logged in user home.
pub async fn get_register_page(session: Session) -> Response {
    if session.user_id().is_some() {
        return redirect(false, endpoints::ROOT);
    }

    registration_page(registration_form(&RegisterForm::default(), &FieldErrors::new()))
        .into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// A registration that passed validation.
struct NewUser {
    username: String,
    email: EmailAddress,
    password: ValidatedPassword,
}

fn validate_username(errors: &mut FieldErrors, raw: &str) -> Option<String> {
    let username = required(errors, "username", raw)?;
    let length = username.graphemes(true).count();

    if length < USERNAME_MIN_LENGTH {
        errors.add("username", USERNAME_TOO_SHORT_MSG);
        return None;
    }

    if length > USERNAME_MAX_LENGTH {
        errors.add("username", USERNAME_TOO_LONG_MSG);
        return None;
    }

    let is_allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !username.chars().all(is_allowed) {
        errors.add("username", USERNAME_INVALID_MSG);
        return None;
    }

    Some(username.to_owned())
}

fn weak_password_message(error: &Error) -> String {
    match error {
        Error::TooWeak(feedback) if !feedback.trim().is_empty() => {
            format!("This password is too easy to guess. {feedback}")
        }
        _ => "This password is too easy to guess.".to_owned(),
    }
}

fn validate(form: &RegisterForm) -> Result<NewUser, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = validate_username(&mut errors, &form.username);

    let email = required(&mut errors, "email", &form.email).and_then(|raw_email| {
        EmailAddress::from_str(raw_email)
            .inspect_err(|_| errors.add("email", INVALID_EMAIL_MSG))
            .ok()
    });

    let password = match (
        required(&mut errors, "password", &form.password),
        required(&mut errors, "confirm_password", &form.confirm_password),
    ) {
        (Some(_), Some(_)) if form.password != form.confirm_password => {
            errors.add("confirm_password", PASSWORD_MISMATCH_MSG);
            None
        }
        (Some(_), Some(_)) => {
            let user_inputs = [form.username.as_str(), form.email.as_str()];

            ValidatedPassword::new(&form.password, &user_inputs)
                .inspect_err(|error| errors.add("password", weak_password_message(error)))
                .ok()
        }
        _ => None,
    };

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(NewUser {
            username,
            email,
            password,
        }),
        _ => Err(errors),
    }
}

/// Create the user and their profile together so that neither exists without the other.
fn create_user_with_profile(
    new_user: NewUser,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<UserID, Error> {
    let transaction = connection.unchecked_transaction()?;

    let user = create_user(&new_user.username, password_hash, &transaction)?;
    create_profile(user.id, &new_user.username, new_user.email, &transaction)?;

    transaction.commit()?;

    Ok(user.id)
}

/// Handler for registration requests via the POST method.
///
/// On success the new user is logged in and sent to the home page.
/// Otherwise, the form is returned with an error message next to each
/// field with a problem and nothing is saved.
pub async fn register_user(
    State(state): State<RegistrationState>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let render_errors = |errors: &FieldErrors| {
        form_response(
            is_htmx,
            registration_form(&form, errors),
            registration_page,
        )
    };

    let new_user = match validate(&form) {
        Ok(new_user) => new_user,
        Err(errors) => return render_errors(&errors),
    };

    let password_hash = match PasswordHash::new(new_user.password.clone(), HASH_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return InternalServerError::default().into_response();
        }
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => create_user_with_profile(new_user, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user_id = match result {
        Ok(user_id) => user_id,
        Err(Error::DuplicateUsername) => {
            let mut errors = FieldErrors::new();
            errors.add("username", DUPLICATE_USERNAME_MSG);
            return render_errors(&errors);
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return error.into_response();
        }
    };

    match set_auth_cookie(jar, user_id, state.cookie_duration) {
        Ok(jar) => (jar, redirect(is_htmx, endpoints::ROOT)).into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod validate_tests {
    use super::{
        PASSWORD_MISMATCH_MSG, RegisterForm, USERNAME_INVALID_MSG, USERNAME_TOO_LONG_MSG,
        USERNAME_TOO_SHORT_MSG, validate,
    };
    use crate::validation::REQUIRED_MESSAGE;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "testuser".to_owned(),
            email: "test@example.com".to_owned(),
            password: "averysecurepassword!!1".to_owned(),
            confirm_password: "averysecurepassword!!1".to_owned(),
        }
    }

    #[test]
    fn accepts_valid_form() {
        let new_user = validate(&valid_form()).expect("want valid form");

        assert_eq!(new_user.username, "testuser");
        assert_eq!(new_user.email.as_str(), "test@example.com");
    }

    #[test]
    fn rejects_short_username() {
        let form = RegisterForm {
            username: "abc".to_owned(),
            ..valid_form()
        };

        let errors = validate(&form).err().expect("want errors");

        assert_eq!(errors.get("username"), Some(USERNAME_TOO_SHORT_MSG));
    }

    #[test]
    fn username_length_counts_graphemes() {
        let form = RegisterForm {
            username: "ééé".to_owned(),
            ..valid_form()
        };

        let errors = validate(&form).err().expect("want errors");

        assert_eq!(errors.get("username"), Some(USERNAME_TOO_SHORT_MSG));
    }

    #[test]
    fn rejects_long_username() {
        let form = RegisterForm {
            username: "a".repeat(151),
            ..valid_form()
        };

        let errors = validate(&form).err().expect("want errors");

        assert_eq!(errors.get("username"), Some(USERNAME_TOO_LONG_MSG));
    }

    #[test]
    fn rejects_username_with_spaces() {
        let form = RegisterForm {
            username: "test user".to_owned(),
            ..valid_form()
        };

        let errors = validate(&form).err().expect("want errors");

        assert_eq!(errors.get("username"), Some(USERNAME_INVALID_MSG));
    }

    #[test]
    fn rejects_missing_and_invalid_email() {
        let missing = RegisterForm {
            email: "".to_owned(),
            ..valid_form()
        };
        let invalid = RegisterForm {
            email: "not-an-email".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            validate(&missing).err().unwrap().get("email"),
            Some(REQUIRED_MESSAGE)
        );
        assert!(validate(&invalid).err().unwrap().get("email").is_some());
    }

    #[test]
    fn rejects_mismatched_passwords() {
        let form = RegisterForm {
            confirm_password: "adifferentsecurepassword!!2".to_owned(),
            ..valid_form()
        };

        let errors = validate(&form).err().expect("want errors");

        assert_eq!(errors.get("confirm_password"), Some(PASSWORD_MISMATCH_MSG));
    }

    #[test]
    fn rejects_weak_password() {
        let form = RegisterForm {
            password: "password".to_owned(),
            confirm_password: "password".to_owned(),
            ..valid_form()
        };

        let errors = validate(&form).err().expect("want errors");

        assert!(errors.get("password").is_some());
    }
}
