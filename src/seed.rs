//! Startup fixtures: users and products read from a TOML file.
//!
//! ```toml
//! [[users]]
//! email = "admin@shop.test"
//! password = "admin123"
//! role = "admin"
//!
//! [[products]]
//! name = "Apple Juice (1000ml)"
//! price = 1.99
//! quantity = 100
//! limit_per_user = 5
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{instrument, debug, info};

use crate::db::DbPool;
use crate::models::{NewProduct, Role};
use crate::repo;

fn default_role() -> Role {
    Role::Customer
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    /// Enables two-factor login for the account
    #[serde(default)]
    pub totp_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Units in stock
    pub quantity: i32,
    #[serde(default)]
    pub limit_per_user: Option<i32>,
}

/// Contents of a seed file
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SeedData {
    pub users: Vec<SeedUser>,
    pub products: Vec<SeedProduct>,
}

/// What [`apply_seed`] inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub products_created: usize,
}

/// Reads and parses a seed file
///
/// ### Errors
///
/// Returns an error if the file cannot be read or is not valid seed TOML
pub fn load_seed_file(path: &Path) -> Result<SeedData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse seed file {}", path.display()))
}

/// Inserts the seeded users and products that do not exist yet
///
/// Users are matched by email, including deleted accounts, and products by
/// name, so applying the same seed twice creates nothing the second time.
#[instrument(skip(pool, seed), fields(users = seed.users.len(), products = seed.products.len()))]
pub fn apply_seed(pool: &DbPool, seed: &SeedData) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for user in &seed.users {
        if repo::find_user_by_email(pool, &user.email)?.is_some() {
            debug!(email = %user.email, "Seed user already exists");
            continue;
        }
        let totp_secret = user.totp_secret.clone().filter(|secret| !secret.is_empty());
        repo::create_user(pool, &user.email, &user.password, user.role, totp_secret)?;
        report.users_created += 1;
    }

    for product in &seed.products {
        if repo::find_product_by_name(pool, &product.name)?.is_some() {
            debug!(name = %product.name, "Seed product already exists");
            continue;
        }
        repo::create_product(
            pool,
            NewProduct::new(product.name.clone(), product.description.clone(), product.price),
            product.quantity,
            product.limit_per_user,
        )?;
        report.products_created += 1;
    }

    info!(
        users_created = report.users_created,
        products_created = report.products_created,
        "Seed applied"
    );
    Ok(report)
}
