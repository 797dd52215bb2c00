//! Income and expense records. Each user only sees their own.

mod create;
mod db;
mod domain;
mod form;
mod list;

pub use create::{
    create_expense_endpoint, create_income_endpoint, get_create_expense_page,
    get_create_income_page,
};
pub use db::{create_transaction, create_transaction_tables, get_total, get_transactions};
pub use domain::{Amount, NewTransaction, Transaction, TransactionId, TransactionKind};
pub use list::{get_expense_list_page, get_income_list_page, post_income_list};
