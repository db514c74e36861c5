use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's shopping basket; every user owns at most one
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::baskets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Basket {
    id: i32,

    /// Owner of the basket
    #[serde(rename = "UserId")]
    user_id: i32,

    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,

    #[serde(rename = "updatedAt")]
    updated_at: NaiveDateTime,
}

impl Basket {
    pub fn get_id(&self) -> i32 {
        self.id
    }

    pub fn get_user_id(&self) -> i32 {
        self.user_id
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::baskets)]
pub struct NewBasket {
    pub user_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewBasket {
    pub fn new(user_id: i32) -> Self {
        let now = Utc::now().naive_utc();
        Self { user_id, created_at: now, updated_at: now }
    }
}
