//! Application router configuration with protected and unprotected route definitions.

use axum::{Router, middleware, routing::get};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, get_log_in_page, get_log_out, get_register_page, post_log_in, register_user},
    category::{create_category_endpoint, get_category_list_page, get_create_category_page},
    endpoints,
    home::get_home_page,
    not_found::get_404_not_found,
    report::{create_report_endpoint, get_create_report_page, get_report_list_page},
    transaction::{
        create_expense_endpoint, create_income_endpoint, get_create_expense_page,
        get_create_income_page, get_expense_list_page, get_income_list_page, post_income_list,
    },
    users_page::get_users_page,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(
            endpoints::REGISTRATION,
            get(get_register_page).post(register_user),
        )
        .route(endpoints::LOG_IN, get(get_log_in_page).post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::CATEGORY_LIST, get(get_category_list_page))
        .route(
            endpoints::CREATE_CATEGORY,
            get(get_create_category_page).post(create_category_endpoint),
        )
        .route(endpoints::REPORT_LIST, get(get_report_list_page));

    let protected_routes = Router::new()
        .route(endpoints::USERS, get(get_users_page))
        .route(
            endpoints::INCOME_LIST,
            get(get_income_list_page).post(post_income_list),
        )
        .route(
            endpoints::CREATE_INCOME,
            get(get_create_income_page).post(create_income_endpoint),
        )
        .route(endpoints::EXPENSE_LIST, get(get_expense_list_page))
        .route(
            endpoints::CREATE_EXPENSE,
            get(get_create_expense_page).post(create_expense_endpoint),
        )
        .route(
            endpoints::CREATE_REPORT,
            get(get_create_report_page).post(create_report_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::{build_router, endpoints, test_utils::get_test_app_state};

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_app_state())).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn public_pages_do_not_require_log_in() {
        let server = get_test_server();

        for endpoint in [
            endpoints::ROOT,
            endpoints::REGISTRATION,
            endpoints::LOG_IN,
            endpoints::CATEGORY_LIST,
            endpoints::CREATE_CATEGORY,
            endpoints::REPORT_LIST,
        ] {
            let response = server.get(endpoint).await;

            assert_eq!(response.status_code(), StatusCode::OK, "GET {endpoint}");
        }
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_log_in() {
        let server = get_test_server();

        for endpoint in [
            endpoints::USERS,
            endpoints::INCOME_LIST,
            endpoints::CREATE_INCOME,
            endpoints::EXPENSE_LIST,
            endpoints::CREATE_EXPENSE,
            endpoints::CREATE_REPORT,
        ] {
            let response = server.get(endpoint).await;

            assert_eq!(response.status_code(), StatusCode::SEE_OTHER, "GET {endpoint}");
            assert!(
                response.header("location").to_str().unwrap().starts_with(endpoints::LOG_IN),
                "GET {endpoint}"
            );
        }
    }

    #[tokio::test]
    async fn static_assets_used_by_pages_are_served() {
        let server = get_test_server();
        let page = server.get(endpoints::ROOT).await;
        let html = scraper::Html::parse_document(&page.text());
        let selector = scraper::Selector::parse("link[href], script[src]").unwrap();

        let assets: Vec<String> = html
            .select(&selector)
            .filter_map(|element| {
                element
                    .value()
                    .attr("href")
                    .or_else(|| element.value().attr("src"))
            })
            .filter(|url| url.starts_with(endpoints::STATIC))
            .map(str::to_owned)
            .collect();

        assert!(!assets.is_empty());
        for asset in assets {
            let response = server.get(&asset).await;

            assert_eq!(response.status_code(), StatusCode::OK, "GET {asset}");
        }
    }

    #[tokio::test]
    async fn unknown_paths_get_404() {
        let server = get_test_server();

        let response = server.get("/no/such/page").expect_failure().await;

        response.assert_status_not_found();
    }
}
