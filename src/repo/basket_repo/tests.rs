use super::*;
use crate::models::{NewProduct, Role};
use crate::repo::{create_product, create_user};
use crate::test_utils::setup_test_db;

fn customer_with_basket(pool: &DbPool, email: &str) -> Basket {
    let user = create_user(pool, email, "pw", Role::Customer, None).unwrap();
    find_or_create_basket(pool, user.get_id()).unwrap()
}

fn product(pool: &DbPool, name: &str) -> i32 {
    let (product, _) = create_product(
        pool,
        NewProduct::new(name.to_string(), String::new(), 2.5),
        10,
        None,
    ).unwrap();
    product.get_id()
}

#[test]
fn test_find_or_create_basket_is_stable() {
    let pool = setup_test_db();
    let user = create_user(&pool, "fry@shop.test", "pw", Role::Customer, None).unwrap();

    let first = find_or_create_basket(&pool, user.get_id()).unwrap();
    let second = find_or_create_basket(&pool, user.get_id()).unwrap();

    assert_eq!(first.get_id(), second.get_id());
    assert_eq!(first.get_user_id(), user.get_id());
    assert_eq!(get_basket(&pool, first.get_id()).unwrap(), Some(first));
}

#[test]
fn test_each_user_gets_own_basket() {
    let pool = setup_test_db();
    let a = customer_with_basket(&pool, "a@shop.test");
    let b = customer_with_basket(&pool, "b@shop.test");
    assert_ne!(a.get_id(), b.get_id());
}

#[test]
fn test_add_and_list_items() {
    let pool = setup_test_db();
    let basket = customer_with_basket(&pool, "leela@shop.test");
    let juice = product(&pool, "Juice");
    let melon = product(&pool, "Melon");

    let first = add_basket_item(&pool, basket.get_id(), juice, 2).unwrap();
    let second = add_basket_item(&pool, basket.get_id(), melon, 1).unwrap();

    assert_eq!(first.get_basket_id(), basket.get_id());
    assert_eq!(first.get_product_id(), juice);
    assert_eq!(first.get_quantity(), 2);

    let items = list_basket_items(&pool, basket.get_id()).unwrap();
    assert_eq!(items, vec![first.clone(), second]);
    assert_eq!(find_basket_item(&pool, basket.get_id(), juice).unwrap(), Some(first));
}

#[test]
fn test_duplicate_product_is_unique_violation() {
    let pool = setup_test_db();
    let basket = customer_with_basket(&pool, "zoidberg@shop.test");
    let juice = product(&pool, "Juice");

    add_basket_item(&pool, basket.get_id(), juice, 1).unwrap();
    let err = add_basket_item(&pool, basket.get_id(), juice, 1).unwrap_err();
    assert!(is_unique_violation(&err));
}

#[test]
fn test_add_item_for_missing_product_fails() {
    let pool = setup_test_db();
    let basket = customer_with_basket(&pool, "hermes@shop.test");

    let err = add_basket_item(&pool, basket.get_id(), 9999, 1).unwrap_err();
    assert!(!is_unique_violation(&err));
}

#[test]
fn test_update_quantity() {
    let pool = setup_test_db();
    let basket = customer_with_basket(&pool, "kif@shop.test");
    let juice = product(&pool, "Juice");
    let item = add_basket_item(&pool, basket.get_id(), juice, 1).unwrap();

    let updated = update_basket_item_quantity(&pool, item.get_id(), 4).unwrap();
    assert_eq!(updated.get_id(), item.get_id());
    assert_eq!(updated.get_quantity(), 4);
    assert!(updated.get_updated_at() >= item.get_updated_at());

    assert!(update_basket_item_quantity(&pool, 12345, 4).is_err());
}

#[test]
fn test_delete_item() {
    let pool = setup_test_db();
    let basket = customer_with_basket(&pool, "scruffy@shop.test");
    let juice = product(&pool, "Juice");
    let item = add_basket_item(&pool, basket.get_id(), juice, 1).unwrap();

    assert!(delete_basket_item(&pool, item.get_id()).unwrap());
    assert!(get_basket_item(&pool, item.get_id()).unwrap().is_none());
    assert!(!delete_basket_item(&pool, item.get_id()).unwrap());
}
