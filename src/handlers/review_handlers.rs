use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::auth::Session;
use crate::dto::{parse_body, CreateReviewDto, SuccessResponse};
use crate::errors::ApiError;
use crate::models::Review;
use crate::repo;
use crate::state::AppState;

/// Handler for writing a product review
///
/// This function handles PUT requests to `/rest/products/{id}/reviews`.
///
/// The author is always the logged-in user; an `author` in the body is
/// ignored. Errors use the `{"status": "error", "message": ...}` envelope.
///
/// ### Returns
///
/// 201 with `{"status": "success"}`
#[instrument(skip(state, session, body))]
pub async fn create_review_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(product_id): Path<i32>,
    body: Bytes,
) -> Result<(StatusCode, Json<SuccessResponse<()>>), ApiError> {
    let Some(user) = session.user() else {
        return Err(ApiError::rejected(StatusCode::UNAUTHORIZED, "Authentication required"));
    };

    let payload: CreateReviewDto = parse_body(&body)
        .map_err(|e| ApiError::rejected(StatusCode::BAD_REQUEST, e.to_string()))?;

    let message = payload.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(ApiError::rejected(StatusCode::BAD_REQUEST, "Review message must not be empty"));
    }

    let author = user.user.get_email();
    if let Some(claimed) = payload.author.as_deref().filter(|claimed| *claimed != author) {
        debug!(claimed, "Ignoring client-supplied review author");
    }

    let review = repo::create_review(&state.pool, product_id, &message, &author)?;
    info!("Stored review {} by {}", review.get_id(), author);

    Ok((StatusCode::CREATED, Json(SuccessResponse::empty())))
}

/// Handler for listing the reviews of a product
///
/// This function handles GET requests to `/rest/products/{id}/reviews`.
#[instrument(skip(state))]
pub async fn list_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<Json<SuccessResponse<Vec<Review>>>, ApiError> {
    let reviews = repo::list_reviews_for_product(&state.pool, product_id)?;
    debug!("Found {} reviews", reviews.len());
    Ok(Json(SuccessResponse::with_data(reviews)))
}
