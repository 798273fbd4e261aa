use std::time::Duration;

use sqlx::MySqlPool;
use tracing::{error, info};

use crate::db::password_resets;

/// Deletes expired password-reset tokens once an hour.
pub async fn start_password_reset_cleanup(pool: MySqlPool) {
    info!("Starting password reset cleanup background job");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));

        loop {
            interval.tick().await;

            match password_resets::delete_expired(&pool).await {
                Ok(0) => {}
                Ok(removed) => info!("Removed {} expired password reset token(s)", removed),
                Err(e) => error!("Failed to remove expired password reset tokens: {}", e),
            }
        }
    });
}
