use actix_web::{get, post, web, HttpResponse, HttpResponseBuilder};
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use sqlx::MySqlPool;
use validator::Validate;

use crate::core::config::{JwtAuthConfig, StudyHubServer};
use crate::core::email_service::reset_password_url;
use crate::core::jwt_auth::{
    cleared_session_cookie, generate_jwt_token, session_cookie, JwtClaims, JwtMiddleware,
};
use crate::core::utils::{generate_reset_token, normalize_email, parse_name};
use crate::core::{AppError, AppSuccessResponse, EmailService};
use crate::db::{password_resets, users};
use crate::models::users::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ResetPasswordRequest, SignupRequest, User, UserProfile,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const RESET_REQUEST_ACCEPTED: &str =
    "If an account exists for that email, a password reset link has been sent";

fn start_session(
    mut response: HttpResponseBuilder,
    user: User,
    jwt_config: &JwtAuthConfig,
    message: &str,
) -> Result<HttpResponse, AppError> {
    let claims = JwtClaims::for_user(
        user.id,
        &user.email,
        &user.name,
        jwt_config.token_expiration_days,
    );
    let token = generate_jwt_token(&claims, jwt_config.secret.expose_secret())?;
    let expires_at = Utc::now().naive_utc() + Duration::days(jwt_config.token_expiration_days);

    Ok(response
        .cookie(session_cookie(token, jwt_config))
        .json(AppSuccessResponse::new(
            AuthResponse {
                user: UserProfile::from(user),
                expires_at,
            },
            message,
        )))
}

#[tracing::instrument(name = "Sign up", skip(pool, request, jwt_config))]
#[post("/signup")]
pub async fn signup(
    pool: web::Data<MySqlPool>,
    jwt_config: web::Data<JwtAuthConfig>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let name = parse_name(&request.name)?;
    let email = normalize_email(&request.email);

    if users::email_exists(&pool, &email).await? {
        return Err(AppError::conflict("User with this email already exists"));
    }

    let password_hash = users::hash_password(&request.password)?;
    let user = users::create_user(&pool, &name, &email, &password_hash).await?;
    tracing::info!("User {} signed up", user.id);

    start_session(
        HttpResponse::Created(),
        user,
        &jwt_config,
        "User registered successfully",
    )
}

#[tracing::instrument(name = "Log in", skip(pool, request, jwt_config))]
#[post("/login")]
pub async fn login(
    pool: web::Data<MySqlPool>,
    jwt_config: web::Data<JwtAuthConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let email = normalize_email(&request.email);

    let user = users::get_user_by_email(&pool, &email)
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

    if !users::verify_password(&request.password, &user.password)? {
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    start_session(HttpResponse::Ok(), user, &jwt_config, "Login successful")
}

#[tracing::instrument(name = "Log out", skip_all)]
#[post("/logout")]
pub async fn logout() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok()
        .cookie(cleared_session_cookie())
        .json(AppSuccessResponse::new(
            MessageResponse {
                message: "Logged out".to_string(),
            },
            "Logout successful",
        )))
}

#[tracing::instrument(name = "Current user", skip(pool, auth), fields(user_id = auth.user_id))]
#[get("/me")]
pub async fn me(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let user = users::get_user_by_id(&pool, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        UserProfile::from(user),
        "Profile retrieved successfully",
    )))
}

#[tracing::instrument(name = "Change password", skip(pool, auth, request), fields(user_id = auth.user_id))]
#[post("/change-password")]
pub async fn change_password(
    pool: web::Data<MySqlPool>,
    auth: JwtMiddleware,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let user = users::get_user_by_id(&pool, auth.user_id).await?;
    if !users::verify_password(&request.current_password, &user.password)? {
        return Err(AppError::validation_error(
            "The current password you provided is incorrect",
        ));
    }

    let password_hash = users::hash_password(&request.new_password)?;
    users::update_password(pool.get_ref(), user.id, &password_hash).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        MessageResponse {
            message: "Password changed successfully".to_string(),
        },
        "Password changed successfully",
    )))
}

#[tracing::instrument(name = "Forgot password", skip(pool, email_service, server_config, request))]
#[post("/forgot-password")]
pub async fn forgot_password(
    pool: web::Data<MySqlPool>,
    email_service: web::Data<EmailService>,
    server_config: web::Data<StudyHubServer>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let email = normalize_email(&request.email);

    if let Some(user) = users::get_user_by_email(&pool, &email).await? {
        let token = generate_reset_token();
        let expires_at = Utc::now().naive_utc() + Duration::hours(1);
        password_resets::replace_reset_token(&pool, user.id, &token, expires_at).await?;

        let reset_url = reset_password_url(&server_config.public_base_url, &token);
        // A delivery failure must look the same as an unknown address.
        if let Err(e) = email_service
            .send_reset_password_email(&user.email, &reset_url)
            .await
        {
            tracing::error!("Reset email for user {} was not delivered: {:?}", user.id, e);
        }
    } else {
        tracing::info!("Password reset requested for unknown email");
    }

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        MessageResponse {
            message: RESET_REQUEST_ACCEPTED.to_string(),
        },
        "Password reset request processed",
    )))
}

#[tracing::instrument(name = "Reset password", skip(pool, request))]
#[post("/reset-password")]
pub async fn reset_password(
    pool: web::Data<MySqlPool>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    if request.password != request.confirm_password {
        return Err(AppError::validation_error("Passwords do not match"));
    }
    if request.password.chars().count() < crate::core::utils::MIN_PASSWORD_LENGTH {
        return Err(AppError::validation_error(
            "Password must be at least 6 characters long",
        ));
    }

    let reset = password_resets::find_valid_reset(&pool, request.token.trim())
        .await?
        .ok_or_else(|| AppError::validation_error("Invalid or expired reset token"))?;

    let password_hash = users::hash_password(&request.password)?;
    password_resets::complete_reset(&pool, &reset, &password_hash).await?;
    tracing::info!("Password reset completed for user {}", reset.user_id);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        MessageResponse {
            message: "Password reset successfully. You can now log in with your new password."
                .to_string(),
        },
        "Password reset successful",
    )))
}
