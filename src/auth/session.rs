//! An extractor for pages that look different to logged in users but do not require a log-in.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::auth::{UserID, cookie::get_token_from_cookies};

/// Who is making a request.
///
/// A missing, undecryptable or expired auth cookie counts as anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Authenticated(UserID),
}

impl Session {
    /// The logged in user's ID, if any.
    pub fn user_id(&self) -> Option<UserID> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(user_id) => Some(*user_id),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;

        Ok(match get_token_from_cookies(&jar) {
            Ok(token) => Session::Authenticated(token.user_id),
            Err(_) => Session::Anonymous,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, extract::FromRef, routing::get};
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};

    use crate::auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, set_auth_cookie};

    use super::Session;

    #[derive(Clone)]
    struct TestState {
        cookie_key: Key,
    }

    impl FromRef<TestState> for Key {
        fn from_ref(state: &TestState) -> Self {
            state.cookie_key.clone()
        }
    }

    async fn who_am_i(session: Session) -> String {
        match session {
            Session::Anonymous => "anonymous".to_owned(),
            Session::Authenticated(user_id) => user_id.to_string(),
        }
    }

    async fn log_in(jar: PrivateCookieJar) -> Result<PrivateCookieJar, crate::Error> {
        set_auth_cookie(jar, UserID::new(42), DEFAULT_COOKIE_DURATION)
    }

    fn get_test_server() -> TestServer {
        let state = TestState {
            cookie_key: Key::from(&Sha512::digest("nafstenoas")),
        };
        let app = Router::new()
            .route("/", get(who_am_i))
            .route("/log_in", get(log_in))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn no_cookie_is_anonymous() {
        let server = get_test_server();

        server.get("/").await.assert_text("anonymous");
    }

    #[tokio::test]
    async fn valid_cookie_is_authenticated() {
        let server = get_test_server();
        let token_cookie = server.get("/log_in").await.cookie(COOKIE_TOKEN);

        server
            .get("/")
            .add_cookie(token_cookie)
            .await
            .assert_text("42");
    }
}
