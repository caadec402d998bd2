use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::validate_jwt;
use crate::database::models::User;
use crate::error::ApiError;
use crate::types::Role;

/// Authenticated user context, loaded fresh from the store on every request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Gate for event mutations: any authenticated non-student
pub async fn event_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers()).await?;

    if !user.role.can_manage_events() {
        tracing::warn!(user_id = %user.id, "Student attempted to manage events");
        return Err(ApiError::forbidden(
            "Students are not allowed to manage events",
        ));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Gate for administrative routes: `Admin` only
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers()).await?;

    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.id, role = %user.role, "Non-admin attempted admin action");
        return Err(ApiError::forbidden("Not authorized to change roles"));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Validate the bearer token and load the user it names
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(token)?;

    let user = state
        .store
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = %claims.user_id, "Token names a user that no longer exists");
            ApiError::unauthorized("User not found")
        })?;

    Ok(AuthUser::from(user))
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("No token, authorization denied")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("No token, authorization denied"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
