pub mod auth;
pub mod response;

pub use auth::{admin_auth, event_auth, AuthUser};
pub use response::{ApiResponse, ApiResult};
