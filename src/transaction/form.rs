//! The form for recording income and expenses.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    category::{Category, CategoryId},
    html::{form_input, form_select, post_form, submit_button},
    transaction::{Amount, NewTransaction},
    validation::{FieldErrors, date_field, required},
};

/// Shown when the submitted category does not exist.
pub const INVALID_CATEGORY_MSG: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// The raw values submitted by the transaction form.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TransactionFormData {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
}

/// Check the submitted values.
///
/// Whether the category exists is only known once the record is saved.
pub fn validate(form: &TransactionFormData) -> Result<NewTransaction, FieldErrors> {
    let mut errors = FieldErrors::new();

    let amount = required(&mut errors, "amount", &form.amount).and_then(|raw_amount| {
        raw_amount
            .parse::<Amount>()
            .inspect_err(|error| errors.add("amount", error.to_string()))
            .ok()
    });

    let category_id = required(&mut errors, "category", &form.category).and_then(|raw_id| {
        raw_id
            .parse::<CategoryId>()
            .inspect_err(|_| errors.add("category", INVALID_CATEGORY_MSG))
            .ok()
    });

    let date = date_field(&mut errors, "date", &form.date);

    match (amount, category_id, date) {
        (Some(amount), Some(category_id), Some(date)) => Ok(NewTransaction {
            amount,
            category_id,
            date,
        }),
        _ => Err(errors),
    }
}

/// The form posting to `endpoint`, filled in with `form` and any `errors`.
pub fn transaction_form(
    endpoint: &str,
    submit_text: &str,
    form: &TransactionFormData,
    errors: &FieldErrors,
    categories: &[Category],
) -> Markup {
    let category_options = categories
        .iter()
        .map(|category| (category.id.to_string(), category.name.to_string()))
        .collect::<Vec<_>>();

    let body = html! {
        (form_input("amount", "Amount", "text", &form.amount, errors.get("amount")))
        (form_select(
            "category",
            "Category",
            &category_options,
            &form.category,
            errors.get("category"),
        ))
        (form_input("date", "Date", "date", &form.date, errors.get("date")))
        (submit_button(submit_text))
    };

    post_form(endpoint, body)
}
