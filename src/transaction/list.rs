//! The income and expense list pages.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Query, State},
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
    date_range::{DateRange, DateRangeQuery},
    endpoints,
    flash::{set_flash, take_flash},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        redirect,
    },
    navigation::NavBar,
    profile::{MISSING_PROFILE_MESSAGE, find_profile_for_user},
    timezone::local_today,
    transaction::{
        Transaction, TransactionKind,
        create::{SaveOutcome, save_transaction},
        form::{TransactionFormData, transaction_form},
        get_transactions,
    },
    validation::{FieldErrors, format_date},
};

/// The state needed for the income and expense lists.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<TransactionListState> for Key {
    fn from_ref(state: &TransactionListState) -> Self {
        state.cookie_key.clone()
    }
}

/// Everything the list page shows besides the add form.
struct ListContent<'a> {
    kind: TransactionKind,
    transactions: &'a [Transaction],
    query: &'a DateRangeQuery,
    flash: Option<&'a str>,
}

/// Render the logged in user's income, optionally limited to a date range.
pub async fn get_income_list_page(
    State(state): State<TransactionListState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    get_list_page(TransactionKind::Income, state, user_id, query, jar)
}

/// Render the logged in user's expenses, optionally limited to a date range.
pub async fn get_expense_list_page(
    State(state): State<TransactionListState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    get_list_page(TransactionKind::Expense, state, user_id, query, jar)
}

/// Handle the add income form on the income list.
///
/// On success the client is sent back to the income list. Invalid forms are
/// shown again with the problems next to the fields.
pub async fn post_income_list(
    State(state): State<TransactionListState>,
    Extension(user_id): Extension<UserID>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let kind = TransactionKind::Income;

    let outcome = match state.db_connection.lock() {
        Ok(connection) => save_transaction(kind, user_id, &form, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match outcome {
        Ok(SaveOutcome::Saved) => redirect(is_htmx, kind.list_endpoint()),
        Ok(SaveOutcome::MissingProfile) => (
            set_flash(jar, MISSING_PROFILE_MESSAGE),
            redirect(is_htmx, kind.list_endpoint()),
        )
            .into_response(),
        Ok(SaveOutcome::Invalid(errors, categories)) => {
            let add_form = add_income_form(&form, &errors, &categories);
            if is_htmx {
                return add_form.into_response();
            }

            let transactions = match load_own_transactions(&state, kind, user_id, None) {
                Ok(transactions) => transactions,
                Err(error) => return error.into_response(),
            };
            let query = DateRangeQuery::default();
            let content = ListContent {
                kind,
                transactions: &transactions,
                query: &query,
                flash: None,
            };

            list_view(&content, Some(add_form)).into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while saving income: {error}");
            error.into_response()
        }
    }
}

fn load_own_transactions(
    state: &TransactionListState,
    kind: TransactionKind,
    user_id: UserID,
    date_range: Option<DateRange>,
) -> Result<Vec<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_own_transactions(kind, user_id, date_range, &connection)
}

fn get_list_page(
    kind: TransactionKind,
    state: TransactionListState,
    user_id: UserID,
    query: DateRangeQuery,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let (transactions, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transactions = get_own_transactions(kind, user_id, query.to_range(), &connection)?;
        let categories = get_all_categories(&connection)?;

        (transactions, categories)
    };

    let add_form = match kind {
        TransactionKind::Income => {
            let today = local_today(&state.local_timezone)
                .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
            let form = TransactionFormData {
                date: format_date(today),
                ..Default::default()
            };

            Some(add_income_form(&form, &FieldErrors::new(), &categories))
        }
        TransactionKind::Expense => None,
    };

    let (jar, flash) = take_flash(jar);
    let content = ListContent {
        kind,
        transactions: &transactions,
        query: &query,
        flash: flash.as_deref(),
    };

    Ok((jar, list_view(&content, add_form)).into_response())
}

/// The records of `kind` owned by the profile of `user_id`.
///
/// A user without a profile owns nothing.
fn get_own_transactions(
    kind: TransactionKind,
    user_id: UserID,
    date_range: Option<DateRange>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    match find_profile_for_user(user_id, connection)? {
        Some(profile) => get_transactions(kind, profile.id, date_range, connection),
        None => Ok(Vec::new()),
    }
}

fn add_income_form(
    form: &TransactionFormData,
    errors: &FieldErrors,
    categories: &[Category],
) -> Markup {
    transaction_form(endpoints::INCOME_LIST, "Add Income", form, errors, categories)
}

fn date_filter_form(kind: TransactionKind, query: &DateRangeQuery) -> Markup {
    html! {
        form method="get" action=(kind.list_endpoint()) class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "Start Date" }
                input
                    id="start_date"
                    type="date"
                    name="start_date"
                    value=[query.start_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "End Date" }
                input
                    id="end_date"
                    type="date"
                    name="end_date"
                    value=[query.end_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="w-32"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
            }

            a href=(kind.list_endpoint()) class=(LINK_STYLE) { "Clear" }
        }
    }
}

fn list_view(content: &ListContent<'_>, add_form: Option<Markup>) -> Markup {
    let kind = content.kind;
    let nav_bar = NavBar::new(kind.list_endpoint(), true).into_html();
    let title = kind.plural_label();

    let page = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { (title) }

                    a href=(kind.create_endpoint()) class=(LINK_STYLE)
                    {
                        "Add " (kind.label())
                    }
                }

                @if let Some(message) = content.flash {
                    (Alert::error(message).into_html())
                }

                (date_filter_form(kind, content.query))

                @if content.transactions.is_empty() {
                    p { "Nothing recorded yet." }
                } @else {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-4 text-right" { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in content.transactions {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (format_date(transaction.date)) }
                                    td class=(TABLE_CELL_STYLE) { (transaction.category_name) }
                                    td class="px-6 py-4 text-right" { (transaction.amount) }
                                }
                            }
                        }
                    }
                }

                @if let Some(add_form) = add_form {
                    section class="max-w-md space-y-4"
                    {
                        h2 class="text-lg font-bold" { "Add " (kind.label()) }
                        (add_form)
                    }
                }
            }
        }
    );

    base(title, &page)
}
