use crate::auth::{hash_password, verify_password};
use crate::db::DbPool;
use crate::models::{NewUser, Role, User};
use crate::schema::users;
use anyhow::{Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{instrument, debug, info};

/// Creates a new user account
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `email` - Login email, must be unique
/// * `password` - Plain-text password; only its hash is stored
/// * `role` - Membership role
/// * `totp_secret` - Secret for two-factor login, if enabled
///
/// ### Returns
///
/// A Result containing the newly created User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The password cannot be hashed
/// - Unable to get a connection from the pool
/// - The email is already taken
#[instrument(skip(pool, password, totp_secret))]
pub fn create_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    role: Role,
    totp_secret: Option<String>,
) -> Result<User> {
    debug!("Creating new user");

    let password_hash = hash_password(password)?;
    let new_user = NewUser::new(email.to_string(), password_hash, role, totp_secret);

    let conn = &mut pool.get()?;
    let user = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .with_context(|| format!("Failed to create user {}", email))?;

    info!("Successfully created user with id: {}", user.get_id());
    Ok(user)
}

/// Retrieves a user by id, deleted or not
#[instrument(skip(pool))]
pub fn get_user(pool: &DbPool, user_id: i32) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Finds the account registered under `email`, deleted or not
#[instrument(skip(pool))]
pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Finds the account registered under `email`, ignoring deleted accounts
#[instrument(skip(pool))]
pub fn find_active_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::email.eq(email))
        .filter(users::deleted_at.is_null())
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Checks login credentials
///
/// ### Returns
///
/// The user if the email belongs to an active account and the password
/// matches, otherwise `None`
///
/// ### Errors
///
/// Returns an error only if the database lookup fails.
#[instrument(skip(pool, password))]
pub fn authenticate_user(pool: &DbPool, email: &str, password: &str) -> Result<Option<User>> {
    let Some(user) = find_active_user_by_email(pool, email)? else {
        debug!("No active user with this email");
        return Ok(None);
    };

    if verify_password(password, user.get_password_hash()) {
        Ok(Some(user))
    } else {
        debug!("Password mismatch");
        Ok(None)
    }
}

/// Marks an account as deleted; it can no longer log in
#[instrument(skip(pool))]
pub fn soft_delete_user(pool: &DbPool, user_id: i32) -> Result<()> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();
    let updated = diesel::update(users::table.find(user_id))
        .set((users::deleted_at.eq(Some(now)), users::updated_at.eq(now)))
        .execute(conn)?;

    if updated == 0 {
        anyhow::bail!("User not found: {}", user_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_create_and_find_user() {
        let pool = setup_test_db();
        let user = create_user(&pool, "jim@shop.test", "ncc-1701", Role::Customer, None).unwrap();

        assert_eq!(user.get_email(), "jim@shop.test");
        assert_eq!(user.get_role(), Role::Customer);
        assert!(!user.has_totp());
        assert_ne!(user.get_password_hash(), "ncc-1701");

        let found = find_active_user_by_email(&pool, "jim@shop.test").unwrap().unwrap();
        assert_eq!(found.get_id(), user.get_id());
        assert_eq!(get_user(&pool, user.get_id()).unwrap().unwrap(), found);
    }

    #[test]
    fn test_duplicate_email_fails() {
        let pool = setup_test_db();
        create_user(&pool, "amy@shop.test", "pw", Role::Customer, None).unwrap();
        assert!(create_user(&pool, "amy@shop.test", "pw2", Role::Customer, None).is_err());
    }

    #[test]
    fn test_authenticate_user() {
        let pool = setup_test_db();
        let user = create_user(&pool, "bender@shop.test", "OhG0dPlease1nsertLiquor!", Role::Customer, None).unwrap();

        let ok = authenticate_user(&pool, "bender@shop.test", "OhG0dPlease1nsertLiquor!").unwrap();
        assert_eq!(ok.map(|u| u.get_id()), Some(user.get_id()));

        assert!(authenticate_user(&pool, "bender@shop.test", "wrong").unwrap().is_none());
        assert!(authenticate_user(&pool, "nobody@shop.test", "OhG0dPlease1nsertLiquor!").unwrap().is_none());
    }

    #[test]
    fn test_injection_shaped_email_matches_nothing() {
        let pool = setup_test_db();
        create_user(&pool, "admin@shop.test", "admin123", Role::Admin, None).unwrap();

        let result = authenticate_user(&pool, "' OR 1=1--", "anything").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_deleted_user_cannot_authenticate() {
        let pool = setup_test_db();
        let user = create_user(&pool, "chris@shop.test", "pw", Role::Customer, None).unwrap();
        soft_delete_user(&pool, user.get_id()).unwrap();

        assert!(find_active_user_by_email(&pool, "chris@shop.test").unwrap().is_none());
        assert!(find_user_by_email(&pool, "chris@shop.test").unwrap().unwrap().is_deleted());
        assert!(authenticate_user(&pool, "chris@shop.test", "pw").unwrap().is_none());
        assert!(get_user(&pool, user.get_id()).unwrap().unwrap().is_deleted());
    }

    #[test]
    fn test_soft_delete_missing_user() {
        let pool = setup_test_db();
        assert!(soft_delete_user(&pool, 999).is_err());
    }
}
