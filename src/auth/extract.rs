use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

use super::session::AuthenticatedUser;
use crate::state::AppState;

/// Name of the cookie browser clients keep their token in
pub const TOKEN_COOKIE: &str = "token";

/// Reads the caller's token from the `Authorization: Bearer` header,
/// falling back to the `token` cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// The caller's session, if the request carries a valid one
///
/// Extraction never fails; anonymous callers get an empty session and each
/// handler decides how to answer them.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<AuthenticatedUser>,
}

impl Session {
    /// The token presented by the caller, valid or not
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn is_deluxe(&self) -> bool {
        self.user.as_ref().is_some_and(AuthenticatedUser::is_deluxe)
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_headers(&parts.headers) else {
            return Ok(Session::default());
        };

        let user = state.authenticate(&token);
        if user.is_none() {
            debug!("Request presented an unknown or expired token");
        }

        Ok(Session { token: Some(token), user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    #[test]
    fn test_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(token_from_headers(&headers), Some("abc.def".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(token_from_headers(&headers), Some("xyz".to_string()));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("language=en; token=from-cookie"));
        assert_eq!(token_from_headers(&headers), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("token=from-cookie"));
        assert_eq!(token_from_headers(&headers), Some("from-header".to_string()));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
