//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{Session, get_user_by_username, normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{
        FORM_ERROR_STYLE, FORM_LABEL_STYLE, base, form_input, form_response, link,
        log_in_register, post_form, redirect, submit_button,
    },
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Please enter a correct username and password.";

const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(username: &str, error_message: Option<&str>, next: Option<&str>) -> Markup {
    let body = html! {
        @if let Some(error_message) = error_message {
            p class=(FORM_ERROR_STYLE) { (error_message) }
        }

        @if let Some(next) = next {
            input type="hidden" name="next" value=(next);
        }

        (form_input("username", "Username", "text", username, None))
        (form_input("password", "Password", "password", "", None))

        div class="flex items-center gap-x-3"
        {
            input
                type="checkbox"
                name="remember_me"
                id="remember_me"
                class="rounded-xs";

            label for="remember_me" class=(FORM_LABEL_STYLE)
            {
                "Keep me logged in for one week"
            }
        }

        (submit_button("Log in"))

        p class="text-sm font-light text-gray-500 dark:text-gray-400"
        {
            "Don't have an account? "
            (link(endpoints::REGISTRATION, "Register here"))
        }
    };

    post_form(endpoints::LOG_IN, body)
}

fn log_in_page(form: Markup) -> Markup {
    base("Log In", &log_in_register("Log in to your account", &form))
}

fn parse_next_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let raw_url = raw_url.filter(|url| !url.is_empty())?;
    let next = normalize_redirect_url(raw_url);

    if next.is_none() {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    next
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Display the log-in page, or send a logged in user home.
pub async fn get_log_in_page(session: Session, Query(query): Query<NextQuery>) -> Response {
    if session.user_id().is_some() {
        return redirect(false, endpoints::ROOT);
    }

    let next = parse_next_url(query.next.as_deref(), "log-in query");

    log_in_page(log_in_form("", None, next.as_deref())).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// The page to go to after logging in.
    pub next: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie set and the client is
/// redirected to the `next` page, or home if there is none.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let next = parse_next_url(user_data.next.as_deref(), "log-in form");
    let username = user_data.username.trim();
    let render_error = |message: &str| {
        form_response(
            is_htmx,
            log_in_form(username, Some(message), next.as_deref()),
            log_in_page,
        )
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return render_error(INTERNAL_ERROR_MSG);
            }
        };

        get_user_by_username(username, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::info!("Log in attempted for unknown user {username:?}");
            return render_error(INVALID_CREDENTIALS_ERROR_MSG);
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return render_error(INTERNAL_ERROR_MSG);
        }
    };

    match user.password_hash.verify(&user_data.password) {
        Ok(true) => {}
        Ok(false) => return render_error(INVALID_CREDENTIALS_ERROR_MSG),
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return render_error(INTERNAL_ERROR_MSG);
        }
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => {
            let next = next.as_deref().unwrap_or(endpoints::ROOT);
            (jar, redirect(is_htmx, next)).into_response()
        }
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            render_error(INTERNAL_ERROR_MSG)
        }
    }
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::COOKIE_TOKEN,
        build_router, endpoints,
        test_utils::{
            TEST_PASSWORD, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            auth_cookie, create_test_user, get_test_app_state, must_get_form,
        },
    };

    use super::{INVALID_CREDENTIALS_ERROR_MSG, REMEMBER_ME_COOKIE_DURATION};

    fn get_test_server() -> (TestServer, crate::AppState) {
        let state = get_test_app_state();
        create_test_user(&state, "testuser");
        let server =
            TestServer::new(build_router(state.clone())).expect("Could not create test server.");

        (server, state)
    }

    /// Test helper macro to assert that two date times are within a couple
    /// of seconds of each other.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr$(,)?) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(2),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[tokio::test]
    async fn log_in_page_has_form() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::LOG_IN).await;

        response.assert_status_ok();
        let html = scraper::Html::parse_document(&response.text());
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::LOG_IN, "hx-post");
        assert_hx_endpoint(&form, endpoints::LOG_IN, "action");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn log_in_page_carries_next_in_form() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::LOG_IN)
            .add_query_param("next", "/income_list/")
            .await;

        let html = scraper::Html::parse_document(&response.text());
        let next = html
            .select(&scraper::Selector::parse("input[name=next]").unwrap())
            .next()
            .expect("No next input found");
        assert_eq!(next.value().attr("type"), Some("hidden"));
        assert_eq!(next.value().attr("value"), Some("/income_list/"));
    }

    #[tokio::test]
    async fn logged_in_user_is_sent_home() {
        let (server, state) = get_test_server();
        let (user, _) = create_test_user(&state, "otheruser");

        let response = server
            .get(endpoints::LOG_IN)
            .add_cookie(auth_cookie(&state, user.id))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "testuser"), ("password", TEST_PASSWORD)])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);
        let token_cookie = response.cookie(COOKIE_TOKEN);

        server
            .get(endpoints::INCOME_LIST)
            .add_cookie(token_cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn htmx_log_in_uses_hx_redirect() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .add_header("HX-Request", "true")
            .form(&[("username", "testuser"), ("password", TEST_PASSWORD)])
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn log_in_redirects_to_next() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[
                ("username", "testuser"),
                ("password", TEST_PASSWORD),
                ("next", "/expense_list/?start_date=2024-01-01"),
            ])
            .await;

        assert_eq!(
            response.header("location"),
            "/expense_list/?start_date=2024-01-01"
        );
    }

    #[tokio::test]
    async fn log_in_ignores_off_site_next() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[
                ("username", "testuser"),
                ("password", TEST_PASSWORD),
                ("next", "https://example.com/"),
            ])
            .await;

        assert_eq!(response.header("location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn log_in_ignores_backslash_next() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[
                ("username", "testuser"),
                ("password", TEST_PASSWORD),
                ("next", "/\\example.com/"),
            ])
            .await;

        assert_eq!(response.header("location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[
                ("username", "testuser"),
                ("password", TEST_PASSWORD),
                ("remember_me", "on"),
            ])
            .await;

        response.assert_status_see_other();
        let token_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close!(
            token_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION
        );
    }

    #[tokio::test]
    async fn log_in_without_password_shows_error() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "testuser")])
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
        assert!(response.text().contains(INVALID_CREDENTIALS_ERROR_MSG));
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "testuser"), ("password", "wrongpassword")])
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
        assert!(response.text().contains(INVALID_CREDENTIALS_ERROR_MSG));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .add_header("HX-Request", "true")
            .form(&[("username", "nobody"), ("password", TEST_PASSWORD)])
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
        let html = scraper::Html::parse_fragment(&response.text());
        let form = must_get_form(&html);
        let error = form
            .select(&scraper::Selector::parse("p").unwrap())
            .next()
            .expect("No error message found");
        assert_eq!(
            error.text().collect::<String>().trim(),
            INVALID_CREDENTIALS_ERROR_MSG
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_fields() {
        let (server, _) = get_test_server();

        server
            .post(endpoints::LOG_IN)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
