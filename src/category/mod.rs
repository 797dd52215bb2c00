//! Categories that classify income and expenses. Categories are shared by all users.

mod create;
mod db;
mod domain;
mod list;

pub use create::{create_category_endpoint, get_create_category_page};
pub use db::{create_category, create_category_table, get_all_categories};
pub use domain::{Category, CategoryId, CategoryKind, CategoryName};
pub use list::get_category_list_page;
