use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{
    user::normalize_email, Event, EventError, EventFilter, EventPatch, Redemption, ResetCode, User,
};
use super::store::{Store, StoreError};
use crate::types::Role;

const USER_COLUMNS: &str = "id, name, email, password, role, created_at, updated_at";

const RESET_CODE_COLUMNS: &str = "user_id, code_hash, expires_at, attempts";

const EVENT_COLUMNS: &str = r#"
    id, name, description, date, time, venue, organized_by, organizer_id,
    total_seats, available_seats, category, registration_deadline,
    contact_email, contact_phone, created_at, updated_at,
    (date < (now() AT TIME ZONE 'utc')::date) AS is_expired
"#;

/// Postgres-backed store. Event mutations lock the row for the duration of
/// the read-modify-write.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error, email: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateEmail(email.to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &user.email))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_user_role(&self, email: &str, role: Role) -> Result<Option<User>, StoreError> {
        let query = format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE email = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_reset_code(&self, code: ResetCode) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_codes (user_id, code_hash, expires_at, attempts)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET code_hash = EXCLUDED.code_hash,
                          expires_at = EXCLUDED.expires_at,
                          attempts = EXCLUDED.attempts
            "#,
        )
        .bind(code.user_id)
        .bind(&code.code_hash)
        .bind(code.expires_at)
        .bind(code.attempts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_reset_code(&self, user_id: Uuid) -> Result<Option<ResetCode>, StoreError> {
        let query = format!("SELECT {RESET_CODE_COLUMNS} FROM password_reset_codes WHERE user_id = $1");
        Ok(sqlx::query_as::<_, ResetCode>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn redeem_reset_code(
        &self,
        user_id: Uuid,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {RESET_CODE_COLUMNS} FROM password_reset_codes WHERE user_id = $1 FOR UPDATE"
        );
        let Some(mut stored) = sqlx::query_as::<_, ResetCode>(&select)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(false);
        };

        let redemption = stored.redeem(code, now);
        match redemption {
            Redemption::Rejected => {
                sqlx::query("UPDATE password_reset_codes SET attempts = $2 WHERE user_id = $1")
                    .bind(user_id)
                    .bind(stored.attempts)
                    .execute(&mut *tx)
                    .await?;
            }
            Redemption::Spent | Redemption::Accepted => {
                sqlx::query("DELETE FROM password_reset_codes WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        if redemption == Redemption::Accepted {
            sqlx::query("UPDATE users SET password = $2, updated_at = $3 WHERE id = $1")
                .bind(user_id)
                .bind(password_hash)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(redemption == Redemption::Accepted)
    }

    async fn insert_event(&self, event: Event) -> Result<Event, StoreError> {
        let query = format!(
            r#"
            INSERT INTO events (
                id, name, description, date, time, venue, organized_by, organizer_id,
                total_seats, available_seats, category, registration_deadline,
                contact_email, contact_phone, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, Event>(&query)
            .bind(event.id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.time)
            .bind(&event.venue)
            .bind(&event.organized_by)
            .bind(event.organizer_id)
            .bind(event.total_seats)
            .bind(event.available_seats)
            .bind(event.category.as_str())
            .bind(event.registration_deadline)
            .bind(&event.contact_email)
            .bind(&event.contact_phone)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"));

        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(expired) = filter.expired {
            query
                .push(" AND (date < (now() AT TIME ZONE 'utc')::date) = ")
                .push_bind(expired);
        }
        query.push(" ORDER BY date ASC, created_at ASC");

        Ok(query.build_query_as::<Event>().fetch_all(&self.pool).await?)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        Ok(sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_event(&self, id: Uuid, actor: Uuid, patch: EventPatch) -> Result<Event, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Event>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(EventError::NotFound(id))?;

        // Dropping `tx` on error rolls back and releases the row lock
        let updated = current.apply_patch(actor, &patch, Utc::now())?;

        let update = format!(
            r#"
            UPDATE events SET
                name = $2, description = $3, date = $4, time = $5, venue = $6,
                organized_by = $7, total_seats = $8, available_seats = $9, category = $10,
                registration_deadline = $11, contact_email = $12, contact_phone = $13,
                updated_at = $14
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let saved = sqlx::query_as::<_, Event>(&update)
            .bind(id)
            .bind(&updated.name)
            .bind(&updated.description)
            .bind(updated.date)
            .bind(&updated.time)
            .bind(&updated.venue)
            .bind(&updated.organized_by)
            .bind(updated.total_seats)
            .bind(updated.available_seats)
            .bind(updated.category.as_str())
            .bind(updated.registration_deadline)
            .bind(&updated.contact_email)
            .bind(&updated.contact_phone)
            .bind(updated.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_event(&self, id: Uuid, actor: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let organizer: Option<Uuid> =
            sqlx::query_scalar("SELECT organizer_id FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let organizer = organizer.ok_or(EventError::NotFound(id))?;
        if organizer != actor {
            return Err(EventError::NotOrganizer { event: id, actor }.into());
        }

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
