//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::Session,
    category::{
        CategoryKind, CategoryName, create_category,
        domain::{CATEGORY_NAME_MAX_LENGTH, CategoryFormData},
    },
    endpoints,
    html::{
        FORM_CONTAINER_STYLE, base, form_input, form_response, form_select, post_form, redirect,
        submit_button,
    },
    navigation::NavBar,
    validation::{FieldErrors, REQUIRED_MESSAGE},
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_create_category_page(session: Session) -> Response {
    let form = create_category_form(&CategoryFormData::default(), &FieldErrors::new());

    create_category_view(form, session.user_id().is_some()).into_response()
}

/// Handle category creation form submission.
///
/// Anyone may create a category. On success the client is sent to the category list.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    session: Session,
    HxRequest(is_htmx): HxRequest,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let (name, kind) = match validate(&form) {
        Ok(valid) => valid,
        Err(errors) => {
            return form_response(is_htmx, create_category_form(&form, &errors), |form| {
                create_category_view(form, session.user_id().is_some())
            });
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_category(name, kind, &connection) {
        Ok(_) => redirect(is_htmx, endpoints::CATEGORY_LIST),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_response()
        }
    }
}

fn validate(form: &CategoryFormData) -> Result<(CategoryName, CategoryKind), FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = CategoryName::new(&form.name)
        .inspect_err(|error| match error {
            Error::CategoryNameTooLong(length) => errors.add(
                "name",
                format!(
                    "Ensure this value has at most {CATEGORY_NAME_MAX_LENGTH} characters \
                    (it has {length})."
                ),
            ),
            _ => errors.add("name", REQUIRED_MESSAGE),
        })
        .ok();

    let raw_kind = form.kind.trim();
    let kind = if raw_kind.is_empty() {
        Some(CategoryKind::default())
    } else {
        raw_kind
            .parse::<CategoryKind>()
            .inspect_err(|_| {
                errors.add(
                    "type",
                    format!(
                        "Select a valid choice. {raw_kind} is not one of the available choices."
                    ),
                )
            })
            .ok()
    };

    match (name, kind) {
        (Some(name), Some(kind)) => Ok((name, kind)),
        _ => Err(errors),
    }
}

fn create_category_view(form: Markup, is_logged_in: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::CREATE_CATEGORY, is_logged_in).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Create Category" }
            (form)
        }
    };

    base("Create Category", &content)
}

fn create_category_form(form: &CategoryFormData, errors: &FieldErrors) -> Markup {
    let kinds = CategoryKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_owned(), kind.label().to_owned()))
        .collect::<Vec<_>>();
    let selected_kind = if form.kind.is_empty() {
        CategoryKind::default().as_str()
    } else {
        form.kind.as_str()
    };

    let body = html! {
        (form_input("name", "Name", "text", &form.name, errors.get("name")))
        (form_select("type", "Type", &kinds, selected_kind, errors.get("type")))
        (submit_button("Create Category"))
    };

    post_form(endpoints::CREATE_CATEGORY, body)
}


#[cfg(test)]
mod create_category_page_tests {
    use axum_test::TestServer;

    use crate::{
        build_router, endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            get_test_app_state, must_get_form,
        },
    };

    #[tokio::test]
    async fn render_page_without_log_in() {
        let server = TestServer::new(build_router(get_test_app_state()))
            .expect("Could not create test server.");

        let response = server.get(endpoints::CREATE_CATEGORY).await;

        response.assert_status_ok();
        let html = scraper::Html::parse_document(&response.text());
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CREATE_CATEGORY, "hx-post");
        assert_hx_endpoint(&form, endpoints::CREATE_CATEGORY, "action");
        assert_form_input(&form, "name", "text");
        assert_form_submit_button(&form);

        let selected = form
            .select(&scraper::Selector::parse("select[name=type] option[selected]").unwrap())
            .next()
            .expect("No selected type");
        assert_eq!(selected.value().attr("value"), Some("income"));
    }
}
