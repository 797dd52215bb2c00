//! The page listing registered users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base},
    navigation::NavBar,
    profile::{UserProfile, get_all_profiles},
};

/// The state needed for the users page.
#[derive(Debug, Clone)]
pub struct UsersPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UsersPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the usernames of everyone with a profile.
pub async fn get_users_page(State(state): State<UsersPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let profiles = get_all_profiles(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user profiles: {error}"))?;

    Ok(users_view(&profiles).into_response())
}

fn users_view(profiles: &[UserProfile]) -> Markup {
    let nav_bar = NavBar::new(endpoints::USERS, true).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Users" }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr { th scope="col" class=(TABLE_CELL_STYLE) { "Username" } }
                    }

                    tbody
                    {
                        @for profile in profiles {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (profile.username) }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Users", &content)
}

#[cfg(test)]
mod users_page_tests {
    use axum_test::TestServer;
    use scraper::{Html, Selector};

    use crate::{
        build_router, endpoints,
        test_utils::{auth_cookie, create_test_user, get_test_app_state},
    };

    #[tokio::test]
    async fn lists_usernames_in_order() {
        let state = get_test_app_state();
        let (user, _) = create_test_user(&state, "zoe_user");
        create_test_user(&state, "adam_user");
        let server =
            TestServer::new(build_router(state.clone())).expect("Could not create test server.");

        let response = server
            .get(endpoints::USERS)
            .add_cookie(auth_cookie(&state, user.id))
            .await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        let usernames = html
            .select(&Selector::parse("tbody td").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(usernames, vec!["adam_user", "zoe_user"]);
    }

    #[tokio::test]
    async fn requires_log_in() {
        let server = TestServer::new(build_router(get_test_app_state()))
            .expect("Could not create test server.");

        let response = server.get(endpoints::USERS).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/login/?next=%2Fusers%2F");
    }
}
