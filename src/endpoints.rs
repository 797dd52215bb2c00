//! The endpoint URIs.
//!
//! Pages that accept a form submission use the same path for `GET` and `POST`.

/// The home page.
pub const ROOT: &str = "/";
/// The page for registering a new user.
pub const REGISTRATION: &str = "/registration/";
/// The page for logging in.
pub const LOG_IN: &str = "/login/";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout/";
/// The page listing registered users.
pub const USERS: &str = "/users/";
/// The page listing all categories.
pub const CATEGORY_LIST: &str = "/category_list/";
/// The page for creating a category.
pub const CREATE_CATEGORY: &str = "/create_category/";
/// The page listing the user's income.
pub const INCOME_LIST: &str = "/income_list/";
/// The page for recording income.
pub const CREATE_INCOME: &str = "/create_income/";
/// The page listing the user's expenses.
pub const EXPENSE_LIST: &str = "/expense_list/";
/// The page for recording an expense.
pub const CREATE_EXPENSE: &str = "/create_expense/";
/// The page for saving a report date range.
pub const CREATE_REPORT: &str = "/create_report/";
/// The page showing the user's income and expense totals.
pub const REPORT_LIST: &str = "/report_list/";
/// The route for static files.
pub const STATIC: &str = "/static";
