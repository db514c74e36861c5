use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{instrument, debug, info, warn};

use crate::auth::{AuthenticatedUser, Session};
use crate::db::DbPool;
use crate::dto::{parse_body, AddBasketItemDto, BasketWithItems, SuccessResponse, UpdateBasketItemDto};
use crate::errors::ApiError;
use crate::models::{BasketItem, StockShortfall};
use crate::repo;
use crate::state::AppState;

const AUTHENTICATION_REQUIRED: &str = "Authentication required";
const INVALID_BASKET_ID: &str = "Invalid BasketId";

fn require_user(session: &Session) -> Result<&AuthenticatedUser, ApiError> {
    session
        .user()
        .ok_or_else(|| ApiError::Unauthorized(AUTHENTICATION_REQUIRED.to_string()))
}

/// Checks an order of `quantity` units of a product against its stock record
///
/// ### Errors
///
/// - `NotFound` if the product has no stock record
/// - `BadRequest` if the per-user limit is exceeded (deluxe members are exempt)
/// - `BadRequest` if there is not enough stock
fn check_quantity(pool: &DbPool, product_id: i32, quantity: i32, deluxe: bool) -> Result<(), ApiError> {
    let Some(stock) = repo::get_quantity_for_product(pool, product_id)? else {
        return Err(ApiError::NotFound("No such product found!".to_string()));
    };

    stock.check_order(quantity, deluxe).map_err(|shortfall| {
        debug!(?shortfall, product_id, quantity, "Order refused");
        match shortfall {
            StockShortfall::OverLimit(limit) => ApiError::BadRequest(format!(
                "You can order only up to {} items of this product.",
                limit
            )),
            StockShortfall::OutOfStock => {
                ApiError::BadRequest("We are out of stock! Sorry for the inconvenience.".to_string())
            }
        }
    })
}

fn require_positive(quantity: i32) -> Result<i32, ApiError> {
    if quantity < 0 {
        return Err(ApiError::BadRequest("Quantity must be a positive number".to_string()));
    }
    Ok(quantity)
}

/// Loads a basket item and makes sure it sits in the caller's basket
fn owned_item(pool: &DbPool, user: &AuthenticatedUser, item_id: i32) -> Result<BasketItem, ApiError> {
    let item = repo::get_basket_item(pool, item_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Basket item not found: {}", item_id)))?;

    if item.get_basket_id() != user.bid {
        warn!(item_id, basket_id = item.get_basket_id(), bid = user.bid, "Basket item belongs to another basket");
        return Err(ApiError::Unauthorized(INVALID_BASKET_ID.to_string()));
    }
    Ok(item)
}

/// Handler for adding a product to the caller's basket
///
/// This function handles POST requests to `/api/BasketItems`.
///
/// The body is parsed from the raw bytes so that a key given twice is
/// rejected instead of being resolved one way or the other.
///
/// ### Returns
///
/// The new basket item in a success envelope
#[instrument(skip(state, session, body))]
pub async fn add_basket_item_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
    body: Bytes,
) -> Result<Json<SuccessResponse<BasketItem>>, ApiError> {
    let user = require_user(&session)?;
    let payload: AddBasketItemDto = parse_body(&body)?;

    if let Some(basket_id) = payload.basket_id {
        if basket_id != user.bid {
            warn!(basket_id, bid = user.bid, "Attempt to add to another user's basket");
            return Err(ApiError::Unauthorized(INVALID_BASKET_ID.to_string()));
        }
    }

    let (Some(product_id), Some(basket_id), Some(quantity)) =
        (payload.product_id, payload.basket_id, payload.quantity.filter(|q| *q != 0))
    else {
        return Err(ApiError::BadRequest("Missing ProductId, BasketId, or quantity".to_string()));
    };
    let quantity = require_positive(quantity)?;

    check_quantity(&state.pool, product_id, quantity, user.is_deluxe())?;

    if repo::find_basket_item(&state.pool, basket_id, product_id)?.is_some() {
        return Err(ApiError::BadRequest("Product is already in the basket".to_string()));
    }

    match repo::add_basket_item(&state.pool, basket_id, product_id, quantity) {
        Ok(item) => {
            info!("Added product {} to basket {}", product_id, basket_id);
            Ok(Json(SuccessResponse::with_data(item)))
        }
        Err(e) if repo::is_unique_violation(&e) => {
            Err(ApiError::BadRequest("Product is already in the basket".to_string()))
        }
        Err(e) => Err(ApiError::Database(e)),
    }
}

/// Handler for changing the quantity of a basket item
///
/// This function handles PUT requests to `/api/BasketItems/{id}`.
/// Without a `quantity` in the body, or with a quantity of 0, the item is
/// returned unchanged.
#[instrument(skip(state, session, body))]
pub async fn update_basket_item_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(item_id): Path<i32>,
    body: Bytes,
) -> Result<Json<SuccessResponse<BasketItem>>, ApiError> {
    let user = require_user(&session)?;
    let payload: UpdateBasketItemDto = parse_body(&body)?;
    let item = owned_item(&state.pool, user, item_id)?;

    if payload.basket_id.is_some_and(|basket_id| basket_id != item.get_basket_id()) {
        warn!(item_id, "Attempt to move a basket item to another basket");
        return Err(ApiError::Unauthorized(INVALID_BASKET_ID.to_string()));
    }

    let Some(quantity) = payload.quantity.filter(|q| *q != 0) else {
        debug!("No quantity given, nothing to update");
        return Ok(Json(SuccessResponse::with_data(item)));
    };
    let quantity = require_positive(quantity)?;

    check_quantity(&state.pool, item.get_product_id(), quantity, user.is_deluxe())?;

    let updated = repo::update_basket_item_quantity(&state.pool, item_id, quantity)?;
    info!("Basket item {} now has quantity {}", item_id, quantity);
    Ok(Json(SuccessResponse::with_data(updated)))
}

/// Handler for reading one of the caller's basket items
#[instrument(skip(state, session))]
pub async fn get_basket_item_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(item_id): Path<i32>,
) -> Result<Json<SuccessResponse<BasketItem>>, ApiError> {
    let user = require_user(&session)?;
    let item = owned_item(&state.pool, user, item_id)?;
    Ok(Json(SuccessResponse::with_data(item)))
}

/// Handler for removing one of the caller's basket items
///
/// ### Returns
///
/// The removed item
#[instrument(skip(state, session))]
pub async fn delete_basket_item_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(item_id): Path<i32>,
) -> Result<Json<SuccessResponse<BasketItem>>, ApiError> {
    let user = require_user(&session)?;
    let item = owned_item(&state.pool, user, item_id)?;

    if !repo::delete_basket_item(&state.pool, item_id)? {
        return Err(ApiError::NotFound(format!("Basket item not found: {}", item_id)));
    }
    info!("Removed basket item {}", item_id);
    Ok(Json(SuccessResponse::with_data(item)))
}

/// Handler for reading the caller's basket with its items
///
/// This function handles GET requests to `/rest/basket/{id}`.
#[instrument(skip(state, session))]
pub async fn get_basket_handler(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(basket_id): Path<i32>,
) -> Result<Json<SuccessResponse<BasketWithItems>>, ApiError> {
    let user = require_user(&session)?;
    if basket_id != user.bid {
        warn!(basket_id, bid = user.bid, "Attempt to read another user's basket");
        return Err(ApiError::Unauthorized(INVALID_BASKET_ID.to_string()));
    }

    let basket = repo::get_basket(&state.pool, basket_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Basket not found: {}", basket_id)))?;
    let items = repo::list_basket_items(&state.pool, basket_id)?;

    Ok(Json(SuccessResponse::with_data(BasketWithItems { basket, items })))
}
