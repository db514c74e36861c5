use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A product in the catalogue
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Product {
    id: i32,
    name: String,
    description: String,
    price: f64,

    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,

    #[serde(rename = "updatedAt")]
    updated_at: NaiveDateTime,
}

impl Product {
    pub fn get_id(&self) -> i32 {
        self.id
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn get_description(&self) -> String {
        self.description.clone()
    }

    pub fn get_price(&self) -> f64 {
        self.price
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewProduct {
    pub fn new(name: String, description: String, price: f64) -> Self {
        let now = Utc::now().naive_utc();
        Self { name, description, price, created_at: now, updated_at: now }
    }
}

/// Stock level and optional per-order limit of a product
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::quantities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Quantity {
    id: i32,

    #[serde(rename = "ProductId")]
    product_id: i32,

    /// Units in stock
    quantity: i32,

    /// Most units a non-deluxe customer may order at once
    #[serde(rename = "limitPerUser")]
    limit_per_user: Option<i32>,
}

/// Why a requested order quantity cannot be fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockShortfall {
    /// The request exceeds the per-user limit
    OverLimit(i32),
    /// Not enough units in stock
    OutOfStock,
}

impl Quantity {
    pub fn new_with_fields(id: i32, product_id: i32, quantity: i32, limit_per_user: Option<i32>) -> Self {
        Self { id, product_id, quantity, limit_per_user }
    }

    pub fn get_product_id(&self) -> i32 {
        self.product_id
    }

    pub fn get_quantity(&self) -> i32 {
        self.quantity
    }

    pub fn get_limit_per_user(&self) -> Option<i32> {
        self.limit_per_user
    }

    /// Checks whether `requested` units may be ordered
    ///
    /// The per-user limit is checked first and does not apply to deluxe
    /// members; the stock check always applies.
    pub fn check_order(&self, requested: i32, deluxe: bool) -> Result<(), StockShortfall> {
        if let Some(limit) = self.limit_per_user {
            if limit < requested && !deluxe {
                return Err(StockShortfall::OverLimit(limit));
            }
        }
        if self.quantity < requested {
            return Err(StockShortfall::OutOfStock);
        }
        Ok(())
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::quantities)]
pub struct NewQuantity {
    pub product_id: i32,
    pub quantity: i32,
    pub limit_per_user: Option<i32>,
}
