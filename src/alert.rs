//! Alert boxes for messages that concern the whole page rather than a single form field.

use maud::{Markup, html};

const ERROR_ALERT_STYLE: &str = "w-full max-w-md p-4 mb-4 text-sm rounded-lg text-red-800 \
    bg-red-50 dark:bg-gray-800 dark:text-red-400";

/// An error message shown in a coloured box at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert<'a> {
    pub message: &'a str,
}

impl<'a> Alert<'a> {
    pub fn error(message: &'a str) -> Self {
        Self { message }
    }

    pub fn into_html(self) -> Markup {
        html! {
            div class=(ERROR_ALERT_STYLE) role="alert" data-alert-kind="error"
            {
                (self.message)
            }
        }
    }
}
