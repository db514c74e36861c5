use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::models::{Basket, BasketItem};

/// An id or count as clients send it: a JSON number or a numeric string
///
/// Browser clients serialize unset form values as the string `"undefined"`;
/// that and the empty string count as absent.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Number(i64),
    Text(String),
}

fn deserialize_loose_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<LooseInt>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(LooseInt::Number(n)) => n,
        Some(LooseInt::Text(text)) => {
            let text = text.trim();
            if text.is_empty() || text == "undefined" {
                return Ok(None);
            }
            text.parse::<i64>()
                .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", text)))?
        }
    };
    i32::try_from(raw)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("integer out of range: {}", raw)))
}

/// Parses a raw JSON request body
///
/// Deserialization failures, including a key given twice, become a 400.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed request body: {}", e)))
}

/// Request body for adding a product to a basket
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct AddBasketItemDto {
    /// The product to add
    #[serde(rename = "ProductId", default, deserialize_with = "deserialize_loose_int")]
    pub product_id: Option<i32>,

    /// The basket to add it to; must be the caller's own basket
    #[serde(rename = "BasketId", default, deserialize_with = "deserialize_loose_int")]
    pub basket_id: Option<i32>,

    /// How many units to add
    #[serde(default, deserialize_with = "deserialize_loose_int")]
    pub quantity: Option<i32>,
}

/// Request body for changing a basket item
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct UpdateBasketItemDto {
    /// If given, must match the basket the item already belongs to
    #[serde(rename = "BasketId", default, deserialize_with = "deserialize_loose_int")]
    pub basket_id: Option<i32>,

    /// The new quantity
    #[serde(default, deserialize_with = "deserialize_loose_int")]
    pub quantity: Option<i32>,
}

/// Request body for writing a product review
#[derive(Deserialize, Debug, Default)]
pub struct CreateReviewDto {
    /// The review text
    #[serde(default)]
    pub message: Option<String>,

    /// Client-claimed author; the session email is stored instead
    #[serde(default)]
    pub author: Option<String>,
}

/// Login credentials
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

/// The `authentication` object of a successful login response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    /// Session token for the `Authorization: Bearer` header or `token` cookie
    pub token: String,

    /// The caller's basket id
    pub bid: i32,

    /// The caller's email
    pub umail: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub authentication: Authentication,
}

/// A basket together with its items
#[derive(Serialize, Debug)]
pub struct BasketWithItems {
    #[serde(flatten)]
    pub basket: Basket,

    #[serde(rename = "BasketItems")]
    pub items: Vec<BasketItem>,
}

/// `{"status": "success", "data": ...}` envelope
#[derive(Serialize, Debug)]
pub struct SuccessResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(data: T) -> Self {
        Self { status: "success", data: Some(data) }
    }
}

impl SuccessResponse<()> {
    pub fn empty() -> Self {
        Self { status: "success", data: None }
    }
}
