pub mod password_reset_cleanup;
