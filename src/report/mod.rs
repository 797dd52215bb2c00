//! Reports: saved date ranges and the income and expense totals page.

mod create;
mod db;
mod list;

pub use create::{create_report_endpoint, get_create_report_page};
pub use db::{Report, create_report, create_report_table, get_reports_for_profile};
pub use list::get_report_list_page;
