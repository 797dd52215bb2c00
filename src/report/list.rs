//! The report page with the logged in user's income and expense totals.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, UserID},
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, link,
    },
    navigation::NavBar,
    profile::find_profile_for_user,
    report::{Report, get_reports_for_profile},
    transaction::{Amount, TransactionKind, get_total},
    validation::format_date,
};

/// The state needed for the report page.
#[derive(Debug, Clone)]
pub struct ReportListState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A logged in user's totals over all of their records, and their saved reports.
#[derive(Debug, PartialEq)]
struct Summary {
    total_income: Amount,
    total_expense: Amount,
    reports: Vec<Report>,
}

/// Render the report page.
///
/// Visitors who are not logged in get the page without any totals.
pub async fn get_report_list_page(
    State(state): State<ReportListState>,
    session: Session,
) -> Result<Response, Error> {
    let Some(user_id) = session.user_id() else {
        return Ok(report_list_view(None).into_response());
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = get_summary(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get totals for user {user_id}: {error}"))?;

    Ok(report_list_view(Some(&summary)).into_response())
}

fn get_summary(user_id: UserID, connection: &Connection) -> Result<Summary, Error> {
    let Some(profile) = find_profile_for_user(user_id, connection)? else {
        return Ok(Summary {
            total_income: Amount::ZERO,
            total_expense: Amount::ZERO,
            reports: Vec::new(),
        });
    };

    Ok(Summary {
        total_income: get_total(TransactionKind::Income, profile.id, connection)?,
        total_expense: get_total(TransactionKind::Expense, profile.id, connection)?,
        reports: get_reports_for_profile(profile.id, connection)?,
    })
}

fn report_list_view(summary: Option<&Summary>) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORT_LIST, summary.is_some()).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Reports" }

                    @if summary.is_some() {
                        a href=(endpoints::CREATE_REPORT) class=(LINK_STYLE) { "Create Report" }
                    }
                }

                @match summary {
                    Some(summary) => {
                        dl class="grid grid-cols-2 gap-2 max-w-sm"
                        {
                            dt class="font-semibold" { "Total Income" }
                            dd id="total-income" class="text-right" { (summary.total_income) }
                            dt class="font-semibold" { "Total Expense" }
                            dd id="total-expense" class="text-right" { (summary.total_expense) }
                        }

                        (reports_table(&summary.reports))
                    }
                    None => {
                        p
                        {
                            (link(endpoints::LOG_IN, "Log in"))
                            " to see your totals."
                        }
                    }
                }
            }
        }
    );

    base("Reports", &content)
}

fn reports_table(reports: &[Report]) -> Markup {
    html! {
        h2 class="text-lg font-bold" { "Saved Reports" }

        @if reports.is_empty() {
            p { "No saved reports." }
        } @else {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Start Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "End Date" }
                    }
                }

                tbody
                {
                    @for report in reports {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (format_date(report.start_date)) }
                            td class=(TABLE_CELL_STYLE) { (format_date(report.end_date)) }
                        }
                    }
                }
            }
        }
    }
}
