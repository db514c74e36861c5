use crate::db::DbPool;
use crate::models::{Basket, BasketItem, NewBasket, NewBasketItem};
use crate::schema::{basket_items, baskets};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{instrument, debug, info};

/// Returns the user's basket, creating it on first use
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The owner of the basket
///
/// ### Returns
///
/// The existing or newly created basket
///
/// ### Errors
///
/// Returns an error if the lookup or the insert fails
#[instrument(skip(pool))]
pub fn find_or_create_basket(pool: &DbPool, user_id: i32) -> Result<Basket> {
    let conn = &mut pool.get()?;

    let basket = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let existing = baskets::table
            .filter(baskets::user_id.eq(user_id))
            .select(Basket::as_select())
            .first(conn)
            .optional()?;

        if let Some(basket) = existing {
            return Ok(basket);
        }

        debug!("No basket yet, creating one");
        let basket = diesel::insert_into(baskets::table)
            .values(&NewBasket::new(user_id))
            .returning(Basket::as_returning())
            .get_result(conn)?;
        info!("Created basket {} for user {}", basket.get_id(), user_id);
        Ok(basket)
    })?;

    Ok(basket)
}

#[instrument(skip(pool))]
pub fn get_basket(pool: &DbPool, basket_id: i32) -> Result<Option<Basket>> {
    let conn = &mut pool.get()?;
    let basket = baskets::table
        .find(basket_id)
        .select(Basket::as_select())
        .first(conn)
        .optional()?;
    Ok(basket)
}

/// Lists the items in a basket, oldest first
#[instrument(skip(pool))]
pub fn list_basket_items(pool: &DbPool, basket_id: i32) -> Result<Vec<BasketItem>> {
    let conn = &mut pool.get()?;
    let items = basket_items::table
        .filter(basket_items::basket_id.eq(basket_id))
        .order(basket_items::id.asc())
        .select(BasketItem::as_select())
        .load(conn)?;
    Ok(items)
}

/// Adds a product line to a basket
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `basket_id` - The basket to add to
/// * `product_id` - The product being ordered
/// * `quantity` - Number of units
///
/// ### Returns
///
/// The stored basket item
///
/// ### Errors
///
/// Returns an error if the basket or product does not exist, or if the
/// product is already in the basket (see [`is_unique_violation`])
#[instrument(skip(pool))]
pub fn add_basket_item(pool: &DbPool, basket_id: i32, product_id: i32, quantity: i32) -> Result<BasketItem> {
    debug!("Adding item to basket");
    let conn = &mut pool.get()?;

    let item = diesel::insert_into(basket_items::table)
        .values(&NewBasketItem::new(basket_id, product_id, quantity))
        .returning(BasketItem::as_returning())
        .get_result(conn)?;

    info!("Added basket item {}", item.get_id());
    Ok(item)
}

#[instrument(skip(pool))]
pub fn get_basket_item(pool: &DbPool, item_id: i32) -> Result<Option<BasketItem>> {
    let conn = &mut pool.get()?;
    let item = basket_items::table
        .find(item_id)
        .select(BasketItem::as_select())
        .first(conn)
        .optional()?;
    Ok(item)
}

/// Finds the line for `product_id` in a basket, if there is one
#[instrument(skip(pool))]
pub fn find_basket_item(pool: &DbPool, basket_id: i32, product_id: i32) -> Result<Option<BasketItem>> {
    let conn = &mut pool.get()?;
    let item = basket_items::table
        .filter(basket_items::basket_id.eq(basket_id))
        .filter(basket_items::product_id.eq(product_id))
        .select(BasketItem::as_select())
        .first(conn)
        .optional()?;
    Ok(item)
}

/// Sets the quantity of a basket item
///
/// ### Errors
///
/// Returns an error if the item does not exist
#[instrument(skip(pool))]
pub fn update_basket_item_quantity(pool: &DbPool, item_id: i32, quantity: i32) -> Result<BasketItem> {
    let conn = &mut pool.get()?;
    let item = diesel::update(basket_items::table.find(item_id))
        .set((
            basket_items::quantity.eq(quantity),
            basket_items::updated_at.eq(Utc::now().naive_utc()),
        ))
        .returning(BasketItem::as_returning())
        .get_result(conn)
        .optional()?;

    match item {
        Some(item) => Ok(item),
        None => anyhow::bail!("Basket item not found: {}", item_id),
    }
}

/// Removes a basket item
///
/// ### Returns
///
/// `true` if an item was deleted, `false` if there was none with this id
#[instrument(skip(pool))]
pub fn delete_basket_item(pool: &DbPool, item_id: i32) -> Result<bool> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(basket_items::table.find(item_id)).execute(conn)?;
    Ok(deleted > 0)
}

/// Whether a repository error was caused by a unique constraint
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DieselError>(),
        Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    )
}

#[cfg(test)]
mod tests;
