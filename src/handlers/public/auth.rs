use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::validate::{is_email, non_empty, FieldErrors};
use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::{reset_code::RESET_CODE_LEN, User};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Session;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}

fn valid_email(errors: &mut FieldErrors, email: &Option<String>) -> String {
    let email = email.as_deref().unwrap_or_default().trim().to_string();
    errors.check(is_email(&email), "email", "Please enter a valid email");
    email
}

fn password_len_ok(password: &Option<String>) -> bool {
    password
        .as_deref()
        .map_or(false, |p| p.chars().count() >= MIN_PASSWORD_LEN)
}

/// POST /api/auth/signup - register a new student account
///
/// Body: `{ "name", "email", "password" }`. Responds 201 with a token and the
/// user, or 409 if the email is taken.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> ApiResult<SessionResponse> {
    let mut errors = FieldErrors::new();
    let name = non_empty(&payload.name);
    errors.check(name.is_some(), "name", "Name is required");
    let email = valid_email(&mut errors, &payload.email);
    errors.check(
        password_len_ok(&payload.password),
        "password",
        "Password must be at least 6 characters long",
    );
    errors.into_result()?;

    let session = state
        .accounts
        .signup(
            &name.unwrap_or_default(),
            &email,
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(ApiResponse::created(SessionResponse::from(session)).with_message("User registered successfully"))
}

/// POST /api/auth/signin - exchange email and password for a token
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SigninRequest>,
) -> ApiResult<SessionResponse> {
    let mut errors = FieldErrors::new();
    let email = valid_email(&mut errors, &payload.email);
    let password = payload.password.unwrap_or_default();
    errors.check(!password.is_empty(), "password", "Password is required");
    errors.into_result()?;

    let session = state.accounts.signin(&email, &password).await?;
    Ok(ApiResponse::success(SessionResponse::from(session)).with_message("Signed in successfully"))
}

/// POST /api/auth/forgot-password - issue a one-time reset code
///
/// Always answers with the same message so the endpoint cannot be used to
/// discover which emails are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    let email = valid_email(&mut errors, &payload.email);
    errors.into_result()?;

    state.accounts.forgot_password(&email).await?;
    Ok(ApiResponse::success(())
        .with_message("If the email is registered, a reset code has been sent"))
}

/// POST /api/auth/reset-password - set a new password using a reset code
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    let email = valid_email(&mut errors, &payload.email);
    let otp = payload.otp.unwrap_or_default();
    errors.check(
        otp.chars().count() == RESET_CODE_LEN,
        "otp",
        "Code must be 6 characters",
    );
    errors.check(
        password_len_ok(&payload.new_password),
        "newPassword",
        "Password must be at least 6 characters long",
    );
    errors.into_result()?;

    state
        .accounts
        .reset_password(&email, &otp, payload.new_password.as_deref().unwrap_or_default())
        .await?;
    Ok(ApiResponse::success(()).with_message("Password reset successfully"))
}
