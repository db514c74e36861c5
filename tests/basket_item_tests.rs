/// Integration tests for basket functionality
///
/// This file contains tests for basket item operations including:
/// - Adding items within and beyond the per-user limit
/// - Refusing to touch another user's basket
/// - Updating and removing items

use axum::http::StatusCode;
use serde_json::json;
use storefront::models::Role;

mod common;
use common::*;

const CLIENT: [u8; 4] = [127, 0, 0, 1];

/// A customer fills their basket and reads it back
#[tokio::test]
async fn test_basket_lifecycle() {
    let state = create_test_state();
    create_user(&state, "jim@shop.test", "ncc-1701", Role::Customer);
    let juice = create_product(&state, "Apple Juice", 100, Some(5));
    let melon = create_product(&state, "Melon", 3, None);
    let app = app_for_client(&state, CLIENT);
    let (token, bid) = login(&app, "jim@shop.test", "ncc-1701").await;

    let (status, juice_item) = request(
        &app,
        "POST",
        "/api/BasketItems",
        Some(&token),
        Some(json!({ "ProductId": juice, "BasketId": bid, "quantity": 5 })),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", juice_item);

    let (status, melon_item) = request(
        &app,
        "POST",
        "/api/BasketItems",
        Some(&token),
        Some(json!({ "ProductId": melon.to_string(), "BasketId": bid.to_string(), "quantity": "2" })),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", melon_item);

    let melon_uri = format!("/api/BasketItems/{}", melon_item["data"]["id"]);
    let (status, body) = request(&app, "PUT", &melon_uri, Some(&token), Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 3);

    let (status, body) = request(&app, "PUT", &melon_uri, Some(&token), Some(json!({ "quantity": 4 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "We are out of stock! Sorry for the inconvenience.");

    let (status, basket) = request(&app, "GET", &format!("/rest/basket/{}", bid), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = basket["data"]["BasketItems"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[1]["quantity"], 3);

    let (status, _) = request(&app, "DELETE", &melon_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, basket) = request(&app, "GET", &format!("/rest/basket/{}", bid), Some(&token), None).await;
    assert_eq!(basket["data"]["BasketItems"].as_array().unwrap().len(), 1);
}

/// Nothing is stored when a user targets someone else's basket
#[tokio::test]
async fn test_cannot_add_to_foreign_basket() {
    let state = create_test_state();
    create_user(&state, "victim@shop.test", "pw", Role::Customer);
    create_user(&state, "attacker@shop.test", "pw", Role::Customer);
    let juice = create_product(&state, "Apple Juice", 100, None);
    let app = app_for_client(&state, CLIENT);

    let (_, victim_bid) = login(&app, "victim@shop.test", "pw").await;
    let (token, _) = login(&app, "attacker@shop.test", "pw").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/BasketItems",
        Some(&token),
        Some(json!({ "ProductId": juice, "BasketId": victim_bid, "quantity": 1 })),
    ).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid BasketId" }));

    let stored = storefront::repo::list_basket_items(&state.pool, victim_bid as i32).unwrap();
    assert!(stored.is_empty());
}

/// Deluxe members may exceed the per-user limit but not the stock
#[tokio::test]
async fn test_deluxe_limits() {
    let state = create_test_state();
    create_user(&state, "deluxe@shop.test", "pw", Role::Deluxe);
    let juice = create_product(&state, "Apple Juice", 8, Some(5));
    let app = app_for_client(&state, CLIENT);
    let (token, bid) = login(&app, "deluxe@shop.test", "pw").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/BasketItems",
        Some(&token),
        Some(json!({ "ProductId": juice, "BasketId": bid, "quantity": 9 })),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "We are out of stock! Sorry for the inconvenience.");

    let (status, _) = request(
        &app,
        "POST",
        "/api/BasketItems",
        Some(&token),
        Some(json!({ "ProductId": juice, "BasketId": bid, "quantity": 8 })),
    ).await;
    assert_eq!(status, StatusCode::OK);
}

/// An expired or forged token is treated as anonymous
#[tokio::test]
async fn test_forged_token_is_anonymous() {
    let state = create_test_state();
    let juice = create_product(&state, "Apple Juice", 100, None);
    let app = app_for_client(&state, CLIENT);

    let (status, body) = request(
        &app,
        "POST",
        "/api/BasketItems",
        Some("eyJhbGciOiJub25lIn0.eyJzdWIiOjF9."),
        Some(json!({ "ProductId": juice, "BasketId": 1, "quantity": 1 })),
    ).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Authentication required" }));
}
