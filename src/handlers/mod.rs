/// Web API Handlers
///
/// Each handler extracts the caller's session and request data, calls the
/// repository layer and maps the outcome to a response or an [`ApiError`].
///
/// [`ApiError`]: crate::errors::ApiError

mod basket_handlers;
mod login_handlers;
mod review_handlers;

// Re-export all handlers
pub use basket_handlers::*;
pub use login_handlers::*;
pub use review_handlers::*;
