//! Shared page layout, styles and form widgets.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use maud::{DOCTYPE, Markup, html};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

// Form styles
pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";
pub const FORM_ERROR_STYLE: &str = "text-red-500 text-base";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// Every form also works as a plain HTML form if this script fails to load.
const HTMX_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/htmx.org@2.0.8/dist/htmx.min.js";

pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Ledgerly" }
                link href="/static/main.css" rel="stylesheet";
                script
                    src=(HTMX_SCRIPT_URL)
                    integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz"
                    crossorigin="anonymous"
                    defer {}
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    // Template adapted from https://flowbite.com/blocks/marketing/404/
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href="/"
                        class="inline-flex text-white bg-blue-600
                            hover:bg-blue-800 focus:ring-4 focus:outline-hidden
                            focus:ring-blue-300 font-medium rounded text-sm px-5
                            py-2.5 text-center dark:focus:ring-blue-900 my-4"
                    {
                        "Back to Homepage"
                    }
                }
            }
        }
    );

    base(title, &content)
}

/// The card layout shared by the log-in and registration pages.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            a href="/" class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                "Ledgerly"
            }

            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        (form_title)
                    }

                    (form)
                }
            }
        }
    }
}

/// The opening of a form that posts to `endpoint`.
///
/// The form works without JavaScript. With HTMX loaded, the server's reply
/// replaces the form in place.
pub fn post_form(endpoint: &str, body: Markup) -> Markup {
    html! {
        form
            method="post"
            action=(endpoint)
            hx-post=(endpoint)
            hx-target="this"
            hx-swap="outerHTML"
            class="w-full space-y-4 md:space-y-6"
        {
            (body)
        }
    }
}

/// A labelled, required input with an optional error message below it.
pub fn form_input(
    name: &str,
    label: &str,
    type_: &str,
    value: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                id=(name)
                type=(type_)
                name=(name)
                value=(value)
                required
                class=(FORM_TEXT_INPUT_STYLE);

            (field_error(error_message))
        }
    }
}

/// A labelled, required select input. `options` are `(value, label)` pairs.
pub fn form_select(
    name: &str,
    label: &str,
    options: &[(String, String)],
    selected: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select id=(name) name=(name) required class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[selected.is_empty()] { "---------" }

                @for (value, text) in options {
                    option value=(value) selected[value == selected] { (text) }
                }
            }

            (field_error(error_message))
        }
    }
}

pub fn field_error(error_message: Option<&str>) -> Markup {
    html! {
        @if let Some(error_message) = error_message
        {
            p class=(FORM_ERROR_STYLE) { (error_message) }
        }
    }
}

pub fn submit_button(text: &str) -> Markup {
    html! {
        button type="submit" class=(BUTTON_PRIMARY_STYLE) { (text) }
    }
}

/// A link with blue text for use in a <p> tag.
pub fn link(url: &str, text: &str) -> Markup {
    html! (
        a href=(url) class=(LINK_STYLE) { (text) }
    )
}

/// Redirect the client to `url`.
///
/// HTMX requests get an `HX-Redirect` header so that the whole page is
/// navigated instead of swapping the response into the form. HTMX only acts
/// on the header for a 2xx response.
pub fn redirect(is_htmx: bool, url: &str) -> Response {
    if is_htmx {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    } else {
        Redirect::to(url).into_response()
    }
}

/// Respond with a form that failed validation.
///
/// HTMX requests only need the form itself, other requests get the full page
/// built by `page`.
pub fn form_response(is_htmx: bool, form: Markup, page: impl FnOnce(Markup) -> Markup) -> Response {
    if is_htmx {
        form.into_response()
    } else {
        page(form).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_htmx::HX_REDIRECT;
    use maud::html;

    use crate::test_utils::{assert_valid_html, parse_html_fragment};

    use super::{form_response, form_select, redirect};

    #[test]
    fn plain_redirect_uses_location() {
        let response = redirect(false, "/income_list/");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/income_list/");
    }

    #[test]
    fn htmx_redirect_uses_hx_redirect() {
        let response = redirect(true, "/income_list/");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(HX_REDIRECT).unwrap(), "/income_list/");
        assert!(response.headers().get("location").is_none());
    }

    #[tokio::test]
    async fn htmx_form_response_is_just_the_form() {
        let response = form_response(true, html!(form {}), |form| html!(main { (form) }));

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let main = scraper::Selector::parse("main").unwrap();
        assert_eq!(html.select(&main).count(), 0);
    }

    #[test]
    fn select_marks_selected_option() {
        let options = vec![
            ("1".to_owned(), "Salary".to_owned()),
            ("2".to_owned(), "Rent".to_owned()),
        ];

        let markup = form_select("category", "Category", &options, "2", None).into_string();
        let html = scraper::Html::parse_fragment(&markup);
        let selected = scraper::Selector::parse("option[selected]").unwrap();
        let selected = html.select(&selected).collect::<Vec<_>>();

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value().attr("value"), Some("2"));
    }
}
