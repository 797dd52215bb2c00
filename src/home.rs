//! The home page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, get_user_by_id},
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
};

/// The state needed for the home page.
#[derive(Debug, Clone)]
pub struct HomePageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HomePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Greet the logged in user by name, or invite visitors to log in.
pub async fn get_home_page(
    State(state): State<HomePageState>,
    session: Session,
) -> Result<Response, Error> {
    let username = match session.user_id() {
        Some(user_id) => {
            let connection = state
                .db_connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)?;

            match get_user_by_id(user_id, &connection) {
                Ok(user) => Some(user.username),
                // The user was deleted after their cookie was issued.
                Err(Error::NotFound) => None,
                Err(error) => return Err(error),
            }
        }
        None => None,
    };

    Ok(home_view(username.as_deref()).into_response())
}

fn home_view(username: Option<&str>) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT, username.is_some()).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(username) = username {
                h1 class="text-2xl font-bold mb-4" { "Welcome, " (username) "!" }

                ul class="space-y-2"
                {
                    li { a href=(endpoints::INCOME_LIST) class=(LINK_STYLE) { "Income" } }
                    li { a href=(endpoints::EXPENSE_LIST) class=(LINK_STYLE) { "Expenses" } }
                    li { a href=(endpoints::CATEGORY_LIST) class=(LINK_STYLE) { "Categories" } }
                    li { a href=(endpoints::REPORT_LIST) class=(LINK_STYLE) { "Reports" } }
                    li { a href=(endpoints::LOG_OUT) class=(LINK_STYLE) { "Log out" } }
                }
            } @else {
                h1 class="text-2xl font-bold mb-4" { "Welcome to Your Budget" }

                p
                {
                    (link(endpoints::LOG_IN, "Log in"))
                    " or "
                    (link(endpoints::REGISTRATION, "register"))
                    " to start keeping track of your income and expenses."
                }
            }
        }
    };

    base("Home", &content)
}
