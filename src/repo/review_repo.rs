use crate::db::DbPool;
use crate::models::{NewReview, Review};
use crate::schema::reviews;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{instrument, info};

/// Stores a review for a product
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `product_id` - The reviewed product
/// * `message` - The review text
/// * `author` - Email of the reviewing user
///
/// ### Returns
///
/// The stored review, with no likes
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The insert fails
#[instrument(skip(pool, message))]
pub fn create_review(pool: &DbPool, product_id: i32, message: &str, author: &str) -> Result<Review> {
    let conn = &mut pool.get()?;

    let review = diesel::insert_into(reviews::table)
        .values(&NewReview::new(product_id, message.to_string(), author.to_string()))
        .returning(Review::as_returning())
        .get_result(conn)?;

    info!("Stored review {} for product {}", review.get_id(), product_id);
    Ok(review)
}

/// Lists the reviews of a product, oldest first
#[instrument(skip(pool))]
pub fn list_reviews_for_product(pool: &DbPool, product_id: i32) -> Result<Vec<Review>> {
    let conn = &mut pool.get()?;
    let found = reviews::table
        .filter(reviews::product_id.eq(product_id))
        .order(reviews::id.asc())
        .select(Review::as_select())
        .load(conn)?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_create_review_starts_without_likes() {
        let pool = setup_test_db();
        let review = create_review(&pool, 1, "Tastes like apples", "jim@shop.test").unwrap();

        assert_eq!(review.get_product_id(), 1);
        assert_eq!(review.get_message(), "Tastes like apples");
        assert_eq!(review.get_author(), "jim@shop.test");
        assert_eq!(review.get_likes_count(), 0);
        assert!(review.get_liked_by().is_empty());
    }

    #[test]
    fn test_list_reviews_only_for_product() {
        let pool = setup_test_db();
        let a = create_review(&pool, 1, "first", "a@shop.test").unwrap();
        create_review(&pool, 2, "other product", "a@shop.test").unwrap();
        let b = create_review(&pool, 1, "second", "b@shop.test").unwrap();

        assert_eq!(list_reviews_for_product(&pool, 1).unwrap(), vec![a, b]);
        assert!(list_reviews_for_product(&pool, 3).unwrap().is_empty());
    }

    #[test]
    fn test_markup_is_stored_verbatim() {
        let pool = setup_test_db();
        let message = "<iframe src=\"javascript:alert(`xss`)\">";
        let review = create_review(&pool, 1, message, "mallory@shop.test").unwrap();
        assert_eq!(review.get_message(), message);
    }
}
