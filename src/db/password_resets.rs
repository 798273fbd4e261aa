use chrono::{NaiveDateTime, Utc};
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::db::users;
use crate::models::users::PasswordReset;

/// Drops any earlier tokens of the user and stores the new one.
pub async fn replace_reset_token(
    pool: &MySqlPool,
    user_id: i32,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    sqlx::query("DELETE FROM tbl_password_resets WHERE user_id = ?")
        .bind(user_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    sqlx::query(
        r#"
        INSERT INTO tbl_password_resets (user_id, token, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .bind(now)
    .execute(tx.as_mut())
    .await
    .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(())
}

pub async fn find_valid_reset(
    pool: &MySqlPool,
    token: &str,
) -> Result<Option<PasswordReset>, AppError> {
    let now = Utc::now().naive_utc();

    sqlx::query_as::<_, PasswordReset>(
        r#"
        SELECT id, user_id, token, expires_at, created_at
        FROM tbl_password_resets
        WHERE token = ? AND expires_at > ?
        "#,
    )
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)
}

/// Sets the new password and burns every reset token of the user.
pub async fn complete_reset(
    pool: &MySqlPool,
    reset: &PasswordReset,
    password_hash: &str,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::db_error)?;

    users::update_password(tx.as_mut(), reset.user_id, password_hash).await?;

    sqlx::query("DELETE FROM tbl_password_resets WHERE user_id = ?")
        .bind(reset.user_id)
        .execute(tx.as_mut())
        .await
        .map_err(AppError::db_error)?;

    tx.commit().await.map_err(AppError::db_error)?;
    Ok(())
}

pub async fn delete_expired(pool: &MySqlPool) -> Result<u64, sqlx::Error> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM tbl_password_resets WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
