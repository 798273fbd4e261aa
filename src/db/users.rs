use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::{MySqlExecutor, MySqlPool};

use crate::core::AppError;
use crate::models::users::User;

const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at";

pub async fn create_user(
    pool: &MySqlPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_users (name, email, password, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::conflict("User with this email already exists")
        }
        other => AppError::db_error(other),
    })?;

    get_user_by_id(pool, result.last_insert_id() as i32).await
}

pub async fn get_user_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM tbl_users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &MySqlPool, user_id: i32) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM tbl_users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn email_exists(pool: &MySqlPool, email: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(count > 0)
}

pub async fn update_password<'e, E>(
    executor: E,
    user_id: i32,
    password_hash: &str,
) -> Result<(), AppError>
where
    E: MySqlExecutor<'e>,
{
    let now = Utc::now().naive_utc();

    sqlx::query(
        r#"
        UPDATE tbl_users
        SET password = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(password_hash)
    .bind(now)
    .bind(user_id)
    .execute(executor)
    .await
    .map_err(AppError::db_error)?;

    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::internal_error("Failed to hash password"))
}

/// Checks `password` against an argon2 PHC string, or a bcrypt hash carried
/// over from accounts created before the switch to argon2.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    if hash.starts_with("$2") {
        return Ok(bcrypt::verify(password, hash)?);
    }

    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        tracing::error!("Stored password hash is malformed: {:?}", e);
        AppError::internal_error("Invalid password hash")
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    #[test]
    fn argon2_hashes_verify_only_the_original_password() {
        let hash = assert_ok!(hash_password("correct horse"));
        assert!(hash.starts_with("$argon2"));
        assert!(assert_ok!(verify_password("correct horse", &hash)));
        assert!(!assert_ok!(verify_password("battery staple", &hash)));
    }

    #[test]
    fn legacy_bcrypt_hashes_are_accepted() {
        let legacy = bcrypt::hash("hunter22", 4).expect("bcrypt hash");
        assert!(assert_ok!(verify_password("hunter22", &legacy)));
        assert!(!assert_ok!(verify_password("hunter23", &legacy)));
    }

    #[test]
    fn garbage_hashes_are_errors() {
        assert_err!(verify_password("anything", "not-a-hash"));
    }
}
