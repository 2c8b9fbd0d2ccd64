//! Accounts, profiles and password checks

use catalog_common::auth::{generate_salt, hash_password, verify_password, MIN_PASSWORD_LEN};
use catalog_common::db::{Profile, User};
use catalog_common::{time, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

pub const MAX_BIO_LEN: usize = 500;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, password_salt, created_at";

/// Signup form
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Editable profile fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

/// User plus profile, as shown on the profile page
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub avatar: Option<String>,
}

/// Check a signup form without touching the database
pub fn validate_signup(new: &NewUser) -> Result<()> {
    if new.username.trim().is_empty() {
        return Err(Error::InvalidInput("Username is required".to_string()));
    }
    if !new.email.contains('@') {
        return Err(Error::InvalidInput("Enter a valid email address".to_string()));
    }
    if new.password != new.password_confirm {
        return Err(Error::InvalidInput("Passwords do not match".to_string()));
    }
    if new.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !email.is_empty() && !email.contains('@') {
        return Err(Error::InvalidInput("Enter a valid email address".to_string()));
    }
    Ok(())
}

/// Create a user and an empty profile in one transaction
pub async fn create_user(pool: &SqlitePool, new: &NewUser) -> Result<User> {
    validate_signup(new)?;
    let username = new.username.trim();

    let salt = generate_salt();
    let hash = hash_password(&new.password, &salt);

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(new.email.trim())
    .bind(&hash)
    .bind(&salt)
    .bind(time::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(Error::from);

    let user = match inserted {
        Ok(user) => user,
        Err(e) if e.is_unique_violation() => {
            return Err(Error::Conflict(format!("Username '{}' is already taken", username)));
        }
        Err(e) => return Err(e),
    };

    sqlx::query("INSERT INTO profiles (user_id, bio) VALUES (?, '')")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Created user '{}' (id {})", user.username, user.id);
    Ok(user)
}

/// Check credentials; `None` when the username is unknown or the password wrong
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let user = get_user_by_username(pool, username.trim()).await?;

    match user {
        Some(user) if verify_password(password, &user.password_salt, &user.password_hash) => {
            Ok(Some(user))
        }
        Some(user) => {
            warn!("Failed login for '{}'", user.username);
            Ok(None)
        }
        None => Ok(None),
    }
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Profile for `user_id`, created empty if it is missing
pub async fn get_profile(pool: &SqlitePool, user_id: i64) -> Result<Profile> {
    sqlx::query(
        "INSERT INTO profiles (user_id, bio) VALUES (?, '') ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    let profile = sqlx::query_as("SELECT user_id, bio, avatar FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(profile)
}

pub async fn profile_view(pool: &SqlitePool, user_id: i64) -> Result<ProfileView> {
    let user = get_user(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))?;
    let profile = get_profile(pool, user_id).await?;

    Ok(ProfileView {
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        bio: profile.bio,
        avatar: profile.avatar,
    })
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<ProfileView> {
    if let Some(bio) = &update.bio {
        if bio.chars().count() > MAX_BIO_LEN {
            return Err(Error::InvalidInput(format!(
                "Bio must be at most {} characters",
                MAX_BIO_LEN
            )));
        }
    }
    if let Some(email) = &update.email {
        validate_email(email.trim())?;
    }

    // Ensure the profile row exists before the transaction
    get_profile(pool, user_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE users SET
            email = COALESCE(?, email),
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name)
        WHERE id = ?
        "#,
    )
    .bind(update.email.as_deref().map(str::trim))
    .bind(update.first_name.as_deref().map(str::trim))
    .bind(update.last_name.as_deref().map(str::trim))
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE profiles SET bio = COALESCE(?, bio) WHERE user_id = ?")
        .bind(update.bio.as_deref())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    profile_view(pool, user_id).await
}
