//! The page and endpoint for saving a report date range.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    endpoints,
    flash::{set_flash, take_flash},
    html::{
        FORM_CONTAINER_STYLE, base, form_input, form_response, post_form, redirect, submit_button,
    },
    navigation::NavBar,
    profile::{MISSING_PROFILE_MESSAGE, find_profile_for_user},
    report::create_report,
    validation::{FieldErrors, date_field},
};

/// The state needed for saving reports.
#[derive(Debug, Clone)]
pub struct CreateReportState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<CreateReportState> for Key {
    fn from_ref(state: &CreateReportState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw values submitted by the report form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReportFormData {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

/// Render the page for saving a report.
pub async fn get_create_report_page(jar: PrivateCookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    let form = report_form(&ReportFormData::default(), &FieldErrors::new());

    (jar, create_report_view(flash.as_deref(), form)).into_response()
}

/// Handle the report form. On success the client is sent to the report list.
pub async fn create_report_endpoint(
    State(state): State<CreateReportState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<ReportFormData>,
) -> Response {
    let (start_date, end_date) = match validate(&form) {
        Ok(dates) => dates,
        Err(errors) => {
            return form_response(is_htmx, report_form(&form, &errors), |form| {
                create_report_view(None, form)
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

    let profile = match find_profile_for_user(user_id, &connection) {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::warn!("User {user_id} tried to save a report without a profile");
            return (
                set_flash(jar, MISSING_PROFILE_MESSAGE),
                redirect(is_htmx, endpoints::CREATE_REPORT),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };

    match create_report(profile.id, start_date, end_date, &connection) {
        Ok(_) => redirect(is_htmx, endpoints::REPORT_LIST),
        Err(error) => {
            tracing::error!("An unexpected error occurred while saving a report: {error}");
            error.into_response()
        }
    }
}

fn validate(form: &ReportFormData) -> Result<(Date, Date), FieldErrors> {
    let mut errors = FieldErrors::new();

    let start_date = date_field(&mut errors, "start_date", &form.start_date);
    let end_date = date_field(&mut errors, "end_date", &form.end_date);

    match (start_date, end_date) {
        (Some(start_date), Some(end_date)) => Ok((start_date, end_date)),
        _ => Err(errors),
    }
}

fn report_form(form: &ReportFormData, errors: &FieldErrors) -> Markup {
    let body = html! {
        (form_input("start_date", "Start Date", "date", &form.start_date, errors.get("start_date")))
        (form_input("end_date", "End Date", "date", &form.end_date, errors.get("end_date")))
        (submit_button("Save Report"))
    };

    post_form(endpoints::CREATE_REPORT, body)
}

fn create_report_view(flash: Option<&str>, form: Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORT_LIST, true).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Create Report" }

            @if let Some(message) = flash {
                (Alert::error(message).into_html())
            }

            (form)
        }
    };

    base("Create Report", &content)
}
