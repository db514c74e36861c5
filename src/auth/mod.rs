/// Authentication
///
/// Password hashing, token signing, the session store and the request
/// extractor that ties them together.

mod extract;
mod password;
mod session;
mod token;

pub use extract::{token_from_headers, Session, TOKEN_COOKIE};
pub use password::{hash_password, verify_password};
pub use session::{AuthenticatedUser, SessionStore};
pub use token::{Claims, TokenIssuer, TokenType};
