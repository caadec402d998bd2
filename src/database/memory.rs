use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    user::normalize_email, Event, EventError, EventFilter, EventPatch, Redemption, ResetCode, User,
};
use super::store::{Store, StoreError};
use crate::types::Role;

/// Process-local store used for development without Postgres and in tests.
/// Every write holds the lock across its read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    reset_codes: HashMap<Uuid, ResetCode>,
    events: HashMap<Uuid, Event>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn user_by_email_mut(&mut self, email: &str) -> Option<&mut User> {
        let email = normalize_email(email);
        self.users.values_mut().find(|u| u.email == email)
    }
}

fn fresh(event: &Event) -> Event {
    let mut event = event.clone();
    event.refresh_expiry(Utc::now().date_naive());
    event
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user_role(&self, email: &str, role: Role) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.user_by_email_mut(email).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn save_reset_code(&self, code: ResetCode) -> Result<(), StoreError> {
        self.inner.write().await.reset_codes.insert(code.user_id, code);
        Ok(())
    }

    async fn find_reset_code(&self, user_id: Uuid) -> Result<Option<ResetCode>, StoreError> {
        Ok(self.inner.read().await.reset_codes.get(&user_id).cloned())
    }

    async fn redeem_reset_code(
        &self,
        user_id: Uuid,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.reset_codes.get_mut(&user_id) else {
            return Ok(false);
        };

        match stored.redeem(code, now) {
            Redemption::Rejected => Ok(false),
            Redemption::Spent => {
                inner.reset_codes.remove(&user_id);
                Ok(false)
            }
            Redemption::Accepted => {
                inner.reset_codes.remove(&user_id);
                if let Some(user) = inner.users.get_mut(&user_id) {
                    user.password = password_hash.to_string();
                    user.updated_at = now;
                }
                Ok(true)
            }
        }
    }

    async fn insert_event(&self, event: Event) -> Result<Event, StoreError> {
        self.inner.write().await.events.insert(event.id, event.clone());
        Ok(fresh(&event))
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let inner = self.inner.read().await;
        let mut events: Vec<Event> = inner
            .events
            .values()
            .map(fresh)
            .filter(|e| e.matches(filter))
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(events)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.inner.read().await.events.get(&id).map(fresh))
    }

    async fn update_event(&self, id: Uuid, actor: Uuid, patch: EventPatch) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.events.get(&id).ok_or(EventError::NotFound(id))?;
        let updated = current.apply_patch(actor, &patch, Utc::now())?;
        inner.events.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_event(&self, id: Uuid, actor: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.events.get(&id).ok_or(EventError::NotFound(id))?;
        current.ensure_organizer(actor)?;
        inner.events.remove(&id);
        Ok(())
    }
}
