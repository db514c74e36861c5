use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Membership role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Deluxe,
    Accounting,
    Admin,
}

impl Role {
    /// The name stored in the `role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Deluxe => "deluxe",
            Role::Accounting => "accounting",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "deluxe" => Ok(Role::Deluxe),
            "accounting" => Ok(Role::Accounting),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A registered user account
///
/// The password hash and TOTP secret never leave the server; they are
/// skipped when a user is serialized.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Database identifier
    id: i32,

    /// Login email, unique across users
    email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    password_hash: String,

    /// Stored role name, see [`Role`]
    role: String,

    /// Base32 TOTP secret, empty when two-factor login is off
    #[serde(skip_serializing)]
    totp_secret: String,

    /// Set when the account was soft-deleted
    #[serde(skip_serializing)]
    deleted_at: Option<NaiveDateTime>,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl User {
    /// Creates a user with all fields specified
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_fields(
        id: i32,
        email: String,
        password_hash: String,
        role: Role,
        totp_secret: String,
        deleted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password_hash,
            role: role.as_str().to_string(),
            totp_secret,
            deleted_at: deleted_at.map(|d| d.naive_utc()),
            created_at: created_at.naive_utc(),
            updated_at: updated_at.naive_utc(),
        }
    }

    pub fn get_id(&self) -> i32 {
        self.id
    }

    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    pub fn get_password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Gets the user's role
    ///
    /// An unrecognised role name in the database is treated as a plain customer.
    pub fn get_role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Customer)
    }

    /// Whether the account has a second factor configured
    pub fn has_totp(&self) -> bool {
        !self.totp_secret.is_empty()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}

/// Insertable form of [`User`]; the id is assigned by SQLite
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub totp_secret: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewUser {
    /// Prepares a new account row from an already hashed password
    pub fn new(email: String, password_hash: String, role: Role, totp_secret: Option<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            email,
            password_hash,
            role: role.as_str().to_string(),
            totp_secret: totp_secret.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}
