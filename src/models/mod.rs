/// Data models module
///
/// This module defines the records stored in the database. Rows that get
/// their id from SQLite come with a separate `New*` insertable struct.

mod json_value;
pub use json_value::JsonValue;

mod user;
pub use user::{NewUser, Role, User};

mod basket;
pub use basket::{Basket, NewBasket};

mod basket_item;
pub use basket_item::{BasketItem, NewBasketItem};

mod product;
pub use product::{NewProduct, NewQuantity, Product, Quantity, StockShortfall};

mod review;
pub use review::{NewReview, Review};
