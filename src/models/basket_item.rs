use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One product line in a basket
///
/// Serialized with the field names clients of the shop API expect
/// (`ProductId`, `BasketId`, `createdAt`, ...).
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::basket_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BasketItem {
    id: i32,

    #[serde(rename = "BasketId")]
    basket_id: i32,

    #[serde(rename = "ProductId")]
    product_id: i32,

    quantity: i32,

    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,

    #[serde(rename = "updatedAt")]
    updated_at: NaiveDateTime,
}

impl BasketItem {
    pub fn get_id(&self) -> i32 {
        self.id
    }

    pub fn get_basket_id(&self) -> i32 {
        self.basket_id
    }

    pub fn get_product_id(&self) -> i32 {
        self.product_id
    }

    pub fn get_quantity(&self) -> i32 {
        self.quantity
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::basket_items)]
pub struct NewBasketItem {
    pub basket_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewBasketItem {
    pub fn new(basket_id: i32, product_id: i32, quantity: i32) -> Self {
        let now = Utc::now().naive_utc();
        Self { basket_id, product_id, quantity, created_at: now, updated_at: now }
    }
}
