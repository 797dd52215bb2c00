//! Helpers for the `next` URL carried through the log-in flow.

use axum::{
    extract::Request,
    http::{HeaderMap, Uri},
};

use crate::endpoints;

/// The query parameter holding the page to return to after logging in.
pub const NEXT_PARAM: &str = "next";

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    // Browsers read a backslash as a slash, so "/\host" is scheme-relative.
    !path.contains('\\') && path != endpoints::LOG_IN
}

/// Reduce `raw_url` to a local path and query, or `None` if it points
/// off-site or back to the log-in page.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Like [normalize_redirect_url] but for the absolute URL HTMX sends in
/// `HX-Current-URL`, which always includes the scheme and host.
fn normalize_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Whether the request was sent by HTMX.
pub fn is_hx_request(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"))
}

/// The log-in URL to send an unauthenticated client to.
///
/// The page the client was trying to reach is passed along as `next`. For
/// HTMX requests this is the page the request came from rather than the
/// endpoint the form posted to. Falls back to the bare log-in page.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = if is_hx_request(request.headers()) {
        request
            .headers()
            .get("hx-current-url")
            .and_then(|header| header.to_str().ok())
            .and_then(normalize_hx_current_url)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    match target {
        Some(target) => build_log_in_redirect_url_from_target(&target),
        None => {
            tracing::warn!("No valid page to return to after log in for {}", request.uri());
            endpoints::LOG_IN.to_owned()
        }
    }
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> String {
    match serde_urlencoded::to_string([(NEXT_PARAM, redirect_target)]) {
        Ok(param) => format!("{}?{}", endpoints::LOG_IN, param),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN.to_owned()
        }
    }
}
