// handlers/elevated/change_role.rs - POST /api/events/change-role handler

use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::api::validate::{is_email, FieldErrors};
use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::Role;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub email: Option<String>,
    pub new_role: Option<String>,
}

impl ChangeRoleRequest {
    fn validate(self) -> Result<(String, Role), ApiError> {
        let mut errors = FieldErrors::new();

        let email = self.email.unwrap_or_default().trim().to_string();
        errors.check(is_email(&email), "email", "Please enter a valid email");

        let role = self
            .new_role
            .as_deref()
            .and_then(|raw| raw.trim().parse::<Role>().ok())
            .filter(Role::is_assignable);
        errors.check(role.is_some(), "newRole", "Valid role is required");

        errors.into_result()?;
        role.map(|role| (email, role))
            .ok_or_else(|| ApiError::validation_error("Validation failed", None))
    }
}

/// POST /api/events/change-role - assign an organizing role to a user
///
/// Body: `{ "email", "newRole" }`. `newRole` must be one of the non-student
/// roles. Responds 404 if no user has that email.
pub async fn change_role(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    ApiJson(payload): ApiJson<ChangeRoleRequest>,
) -> ApiResult<User> {
    let (email, role) = payload.validate()?;

    let user = state.accounts.change_role(&email, role).await?;
    tracing::info!(admin_id = %admin.id, user_id = %user.id, role = %role, "Role assigned");

    Ok(ApiResponse::success(user).with_message(format!("User role updated successfully to {}", role)))
}
