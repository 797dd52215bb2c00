//! Pages and endpoints for recording income and expenses.

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

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    category::{Category, get_all_categories},
    flash::{set_flash, take_flash},
    html::{FORM_CONTAINER_STYLE, base, form_response, redirect},
    navigation::NavBar,
    profile::{MISSING_PROFILE_MESSAGE, find_profile_for_user},
    timezone::local_today,
    transaction::{
        TransactionKind, create_transaction,
        form::{INVALID_CATEGORY_MSG, TransactionFormData, transaction_form, validate},
    },
    validation::{FieldErrors, format_date},
};

/// The state needed for recording income and expenses.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<CreateTransactionState> for Key {
    fn from_ref(state: &CreateTransactionState) -> Self {
        state.cookie_key.clone()
    }
}

/// What happened to a submitted transaction form.
pub(super) enum SaveOutcome {
    Saved,
    Invalid(FieldErrors, Vec<Category>),
    MissingProfile,
}

/// Validate `form` and save it as a record of `kind` owned by the profile of `user_id`.
pub(super) fn save_transaction(
    kind: TransactionKind,
    user_id: UserID,
    form: &TransactionFormData,
    connection: &Connection,
) -> Result<SaveOutcome, Error> {
    let new_transaction = match validate(form) {
        Ok(new_transaction) => new_transaction,
        Err(errors) => return Ok(SaveOutcome::Invalid(errors, get_all_categories(connection)?)),
    };

    let Some(profile) = find_profile_for_user(user_id, connection)? else {
        tracing::warn!("User {user_id} tried to save a {} without a profile", kind.table());
        return Ok(SaveOutcome::MissingProfile);
    };

    match create_transaction(kind, profile.id, &new_transaction, connection) {
        Ok(_) => Ok(SaveOutcome::Saved),
        Err(Error::InvalidCategory) => {
            let mut errors = FieldErrors::new();
            errors.add("category", INVALID_CATEGORY_MSG);

            Ok(SaveOutcome::Invalid(errors, get_all_categories(connection)?))
        }
        Err(error) => Err(error),
    }
}

/// Render the page for recording income.
pub async fn get_create_income_page(
    State(state): State<CreateTransactionState>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    get_create_page(TransactionKind::Income, state, jar)
}

/// Render the page for recording an expense.
pub async fn get_create_expense_page(
    State(state): State<CreateTransactionState>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    get_create_page(TransactionKind::Expense, state, jar)
}

/// Handle the income form. On success the client is sent to the income list.
pub async fn create_income_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<TransactionFormData>,
) -> Response {
    create_endpoint(TransactionKind::Income, state, user_id, is_htmx, jar, form)
}

/// Handle the expense form. On success the client is sent to the expense list.
pub async fn create_expense_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<TransactionFormData>,
) -> Response {
    create_endpoint(TransactionKind::Expense, state, user_id, is_htmx, jar, form)
}

fn get_create_page(
    kind: TransactionKind,
    state: CreateTransactionState,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(&connection)?
    };

    let (jar, flash) = take_flash(jar);
    let form = TransactionFormData {
        date: format_date(today),
        ..Default::default()
    };
    let form = create_form(kind, &form, &FieldErrors::new(), &categories);

    Ok((jar, create_view(kind, flash.as_deref(), form)).into_response())
}

fn create_endpoint(
    kind: TransactionKind,
    state: CreateTransactionState,
    user_id: UserID,
    is_htmx: bool,
    jar: PrivateCookieJar,
    form: TransactionFormData,
) -> Response {
    let outcome = match state.db_connection.lock() {
        Ok(connection) => save_transaction(kind, user_id, &form, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match outcome {
        Ok(SaveOutcome::Saved) => redirect(is_htmx, kind.list_endpoint()),
        Ok(SaveOutcome::Invalid(errors, categories)) => form_response(
            is_htmx,
            create_form(kind, &form, &errors, &categories),
            |form| create_view(kind, None, form),
        ),
        Ok(SaveOutcome::MissingProfile) => (
            set_flash(jar, MISSING_PROFILE_MESSAGE),
            redirect(is_htmx, kind.create_endpoint()),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while saving a {}: {error}", kind.table());
            error.into_response()
        }
    }
}

fn create_form(
    kind: TransactionKind,
    form: &TransactionFormData,
    errors: &FieldErrors,
    categories: &[Category],
) -> Markup {
    transaction_form(
        kind.create_endpoint(),
        &format!("Add {}", kind.label()),
        form,
        errors,
        categories,
    )
}

fn create_view(kind: TransactionKind, flash: Option<&str>, form: Markup) -> Markup {
    let nav_bar = NavBar::new(kind.list_endpoint(), true).into_html();
    let title = format!("Add {}", kind.label());

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { (title) }

            @if let Some(message) = flash {
                (Alert::error(message).into_html())
            }

            (form)
        }
    };

    base(&title, &content)
}
