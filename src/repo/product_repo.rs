use crate::db::DbPool;
use crate::models::{NewProduct, NewQuantity, Product, Quantity};
use crate::schema::{products, quantities};
use anyhow::Result;
use diesel::prelude::*;
use tracing::{instrument, debug, info};

/// Creates a product together with its stock record
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `new_product` - Name, description and price of the product
/// * `stock` - Units in stock
/// * `limit_per_user` - Most units a non-deluxe customer may order at once
///
/// ### Returns
///
/// The created product and stock record
///
/// ### Errors
///
/// Returns an error if either insert fails; nothing is stored in that case.
#[instrument(skip(pool, new_product), fields(name = %new_product.name))]
pub fn create_product(
    pool: &DbPool,
    new_product: NewProduct,
    stock: i32,
    limit_per_user: Option<i32>,
) -> Result<(Product, Quantity)> {
    debug!("Creating new product");
    let conn = &mut pool.get()?;

    let created = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let product = diesel::insert_into(products::table)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(conn)?;

        let quantity = diesel::insert_into(quantities::table)
            .values(&NewQuantity { product_id: product.get_id(), quantity: stock, limit_per_user })
            .returning(Quantity::as_returning())
            .get_result(conn)?;

        Ok((product, quantity))
    })?;

    info!("Successfully created product with id: {}", created.0.get_id());
    Ok(created)
}

#[instrument(skip(pool))]
pub fn get_product(pool: &DbPool, product_id: i32) -> Result<Option<Product>> {
    let conn = &mut pool.get()?;
    let product = products::table
        .find(product_id)
        .select(Product::as_select())
        .first(conn)
        .optional()?;
    Ok(product)
}

/// Finds a product by its exact name
#[instrument(skip(pool))]
pub fn find_product_by_name(pool: &DbPool, name: &str) -> Result<Option<Product>> {
    let conn = &mut pool.get()?;
    let product = products::table
        .filter(products::name.eq(name))
        .select(Product::as_select())
        .first(conn)
        .optional()?;
    Ok(product)
}

#[instrument(skip(pool))]
pub fn list_products(pool: &DbPool) -> Result<Vec<Product>> {
    let conn = &mut pool.get()?;
    let all = products::table
        .order(products::id.asc())
        .select(Product::as_select())
        .load(conn)?;
    Ok(all)
}

/// Gets the stock record of a product
#[instrument(skip(pool))]
pub fn get_quantity_for_product(pool: &DbPool, product_id: i32) -> Result<Option<Quantity>> {
    let conn = &mut pool.get()?;
    let quantity = quantities::table
        .filter(quantities::product_id.eq(product_id))
        .select(Quantity::as_select())
        .first(conn)
        .optional()?;
    Ok(quantity)
}
