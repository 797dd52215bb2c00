//! One-shot messages that survive a single redirect.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};

const COOKIE_FLASH: &str = "flash";

/// Store `message` to be shown on the next page the client loads.
pub fn set_flash(jar: PrivateCookieJar, message: &str) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_FLASH, message.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Take the pending message out of `jar`, if there is one.
///
/// The returned jar removes the message from the client.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<String>) {
    match jar.get(COOKIE_FLASH) {
        Some(cookie) => {
            let message = cookie.value().to_owned();
            let jar = jar.remove(Cookie::build(COOKIE_FLASH).path("/"));

            (jar, Some(message))
        }
        None => (jar, None),
    }
}
