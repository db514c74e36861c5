use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::JsonValue;

/// A customer review of a product
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Review {
    id: i32,

    /// The reviewed product
    #[serde(rename = "product")]
    product_id: i32,

    /// Review text
    message: String,

    /// Email of the user who wrote the review
    author: String,

    #[serde(rename = "likesCount")]
    likes_count: i32,

    /// Emails of the users who liked the review, as a JSON array
    #[serde(rename = "likedBy")]
    liked_by: JsonValue,

    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,
}

impl Review {
    pub fn get_id(&self) -> i32 {
        self.id
    }

    pub fn get_product_id(&self) -> i32 {
        self.product_id
    }

    pub fn get_message(&self) -> String {
        self.message.clone()
    }

    pub fn get_author(&self) -> String {
        self.author.clone()
    }

    pub fn get_likes_count(&self) -> i32 {
        self.likes_count
    }

    /// Gets the emails of the users who liked this review
    ///
    /// Entries that are not strings are skipped.
    pub fn get_liked_by(&self) -> Vec<String> {
        self.liked_by
            .0
            .as_array()
            .map(|users| {
                users
                    .iter()
                    .filter_map(|u| u.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

/// Insertable form of [`Review`]
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::reviews)]
pub struct NewReview {
    pub product_id: i32,
    pub message: String,
    pub author: String,
    pub likes_count: i32,
    pub liked_by: JsonValue,
    pub created_at: NaiveDateTime,
}

impl NewReview {
    /// A fresh review: no likes yet
    pub fn new(product_id: i32, message: String, author: String) -> Self {
        Self {
            product_id,
            message,
            author,
            likes_count: 0,
            liked_by: JsonValue::empty_array(),
            created_at: Utc::now().naive_utc(),
        }
    }
}
