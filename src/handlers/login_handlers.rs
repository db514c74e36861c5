use axum::{
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{instrument, debug, info, warn};

use crate::auth::{AuthenticatedUser, Session};
use crate::dto::{parse_body, Authentication, LoginDto, LoginResponse, SuccessResponse};
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;
use crate::state::AppState;

/// Address key used when the peer address is not known
const UNKNOWN_CLIENT: &str = "unknown";

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware limiting login requests per client address
///
/// Over the limit the request is answered with 429 and a `Retry-After`
/// header without reaching the login handler.
pub async fn login_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match state.ip_limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            warn!(client = %key, retry_after_secs = retry_after.as_secs(), "Login rate limit exceeded");
            let mut response = ApiError::TooManyRequests(format!(
                "Too many login attempts from this IP, please try again after {} minutes.",
                state.ip_limiter.window().as_secs() / 60
            ))
            .into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
            response
        }
    }
}

/// Opens a session for a user whose credentials have been checked
fn open_session(state: &AppState, user: User) -> Result<LoginResponse, ApiError> {
    let basket = repo::find_or_create_basket(&state.pool, user.get_id())?;
    let token = state.tokens.issue_session(&user)?;
    let umail = user.get_email();

    state.sessions.put(
        token.clone(),
        AuthenticatedUser {
            user,
            bid: basket.get_id(),
            expires_at: Utc::now() + state.tokens.ttl(),
        },
    );

    Ok(LoginResponse {
        authentication: Authentication { token, bid: basket.get_id(), umail },
    })
}

/// Handler for logging in with email and password
///
/// This function handles POST requests to `/rest/user/login`.
///
/// Every rejected credential counts against the email; once the limit is
/// reached, further attempts are refused until the timeout has passed, even
/// with the right password. A successful login clears the count.
///
/// ### Returns
///
/// The session token, basket id and email, or a `totp_token_required`
/// challenge for accounts with two-factor login
#[instrument(skip(state, body))]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials: LoginDto = parse_body(&body)?;
    let email = credentials.email;

    if !state.login_attempts.is_allowed(&email) {
        warn!(email = %email, "Login refused, too many failed attempts");
        return Err(ApiError::TooManyRequests("Login attempts exceeded. Please try again later.".to_string()));
    }

    let user = match repo::authenticate_user(&state.pool, &email, &credentials.password) {
        Ok(Some(user)) => user,
        Ok(None) => {
            state.login_attempts.record_failure(&email);
            info!(email = %email, attempts = state.login_attempts.attempts(&email), "Invalid credentials");
            return Err(ApiError::Unauthorized("Invalid email or password.".to_string()));
        }
        Err(e) => {
            state.login_attempts.record_failure(&email);
            return Err(ApiError::Database(e));
        }
    };

    if user.has_totp() {
        debug!(user_id = user.get_id(), "Second factor required");
        let tmp_token = state.tokens.issue_second_factor(&user)?;
        return Err(ApiError::SecondFactorRequired { tmp_token });
    }

    state.login_attempts.reset(&email);
    let response = open_session(&state, user)?;
    info!(email = %email, bid = response.authentication.bid, "Login successful");
    Ok(Json(response))
}

/// Handler describing the caller
///
/// This function handles GET requests to `/rest/user/whoami`. Anonymous
/// callers get an empty `user` object.
#[instrument(skip(session))]
pub async fn whoami_handler(session: Session) -> Json<Value> {
    let user = match session.user() {
        Some(current) => json!({
            "id": current.user.get_id(),
            "email": current.user.get_email(),
            "role": current.user.get_role(),
        }),
        None => json!({}),
    };
    Json(json!({ "user": user }))
}

/// Handler ending the caller's session
///
/// This function handles POST requests to `/rest/user/logout`. The token
/// stops authenticating immediately, although it has not expired.
#[instrument(skip(state, session))]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Json<SuccessResponse<()>> {
    if let Some(token) = session.token() {
        if state.sessions.remove(token).is_some() {
            info!("Session closed");
        }
    }
    Json(SuccessResponse::empty())
}
