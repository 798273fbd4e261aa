use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "All fields are required"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "All fields are required"),
        email(message = "Please provide a valid email address")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters long"))]
    pub new_password: String,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Validate, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "All fields are required"))]
    pub token: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    pub password: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    #[test]
    fn signup_requires_a_real_email_and_long_password() {
        let valid = SignupRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
        };
        assert_ok!(valid.validate());

        let short = SignupRequest {
            password: "abc".into(),
            ..valid_signup()
        };
        assert_err!(short.validate());

        let bad_email = SignupRequest {
            email: "ada-at-example".into(),
            ..valid_signup()
        };
        assert_err!(bad_email.validate());
    }

    #[test]
    fn missing_fields_deserialize_as_empty_and_fail_validation() {
        let request: ResetPasswordRequest =
            serde_json::from_str(r#"{"token":"abc"}"#).expect("valid json");
        assert_eq!(request.password, "");
        assert_err!(request.validate());
    }

    fn valid_signup() -> SignupRequest {
        SignupRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
        }
    }
}
