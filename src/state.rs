use rand::RngCore;
use tracing::{debug, warn};

use crate::auth::{AuthenticatedUser, SessionStore, TokenIssuer, TokenType};
use crate::config::Config;
use crate::db::DbPool;
use crate::rate_limit::{FixedWindowLimiter, LoginAttempts};

/// Everything the handlers share
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub tokens: TokenIssuer,
    pub sessions: SessionStore,
    /// Failed logins per email
    pub login_attempts: LoginAttempts,
    /// Login requests per client address
    pub ip_limiter: FixedWindowLimiter,
}

impl AppState {
    /// Builds the shared state from a pool and a resolved configuration
    ///
    /// Without a configured `jwt_secret` a random one is generated, so
    /// tokens do not survive a restart.
    pub fn new(pool: DbPool, config: Config) -> Self {
        let secret = match &config.jwt_secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => {
                warn!("No jwt_secret configured, generating a random one");
                random_secret()
            }
        };

        Self {
            tokens: TokenIssuer::new(&secret, config.token_ttl()),
            sessions: SessionStore::new(),
            login_attempts: LoginAttempts::new(config.max_login_attempts, config.login_attempt_timeout()),
            ip_limiter: FixedWindowLimiter::new(config.ip_rate_limit_max, config.ip_rate_limit_window()),
            pool,
            config,
        }
    }

    /// Resolves a presented token to its session
    ///
    /// The token must carry a valid signature, be unexpired, be a session
    /// token (not a second-factor one) and still be held by the store.
    pub fn authenticate(&self, token: &str) -> Option<AuthenticatedUser> {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Token rejected: {}", e);
                return None;
            }
        };

        if claims.token_type != TokenType::Session {
            debug!("Token of type {:?} cannot open a session", claims.token_type);
            return None;
        }

        self.sessions
            .get(token)
            .filter(|session| session.user.get_id() == claims.sub)
    }

    /// Drops expired sessions and stale limiter entries
    pub fn purge_expired(&self) {
        self.sessions.purge_expired();
        self.login_attempts.purge_expired();
        self.ip_limiter.purge_expired();
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
