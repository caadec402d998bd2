use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::models::{Event, EventError, EventFilter, EventPatch, ResetCode, User};
use crate::types::Role;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for users, reset codes and events.
///
/// `update_event` and `delete_event` perform the organizer check and the seat
/// adjustment atomically with respect to other writers of the same event.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fails with `DuplicateEmail` if the email is already taken
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_user_role(&self, email: &str, role: Role) -> Result<Option<User>, StoreError>;

    /// Replace any outstanding code for the user
    async fn save_reset_code(&self, code: ResetCode) -> Result<(), StoreError>;
    async fn find_reset_code(&self, user_id: Uuid) -> Result<Option<ResetCode>, StoreError>;
    /// Check `code` against the user's outstanding reset code and, if it
    /// matches, set `password_hash` and consume the code. Wrong guesses are
    /// counted and spent codes removed. Concurrent callers presenting the same
    /// code see at most one `true`.
    async fn redeem_reset_code(
        &self,
        user_id: Uuid,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn insert_event(&self, event: Event) -> Result<Event, StoreError>;
    /// Matching events ordered by date ascending
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;
    async fn update_event(&self, id: Uuid, actor: Uuid, patch: EventPatch) -> Result<Event, StoreError>;
    async fn delete_event(&self, id: Uuid, actor: Uuid) -> Result<(), StoreError>;
}
