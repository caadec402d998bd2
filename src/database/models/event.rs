use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Category;

/// A campus event and its seat inventory.
///
/// `available_seats` always lies in `[0, total_seats]`. `organizer_id` is fixed
/// at creation and is the only identity allowed to mutate the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub venue: String,
    pub organized_by: String,
    pub organizer_id: Uuid,
    pub total_seats: i32,
    pub available_seats: i32,
    pub category: Category,
    pub registration_deadline: DateTime<Utc>,
    pub contact_email: String,
    pub contact_phone: String,
    /// Derived on read: the event date is before today (UTC)
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub venue: String,
    pub organized_by: String,
    pub total_seats: i32,
    pub category: Category,
    pub registration_deadline: DateTime<Utc>,
    pub contact_email: String,
    pub contact_phone: String,
}

/// Validated partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub organized_by: Option<String>,
    pub total_seats: Option<i32>,
    pub category: Option<Category>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Listing filter for `GET /api/events`
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub category: Option<Category>,
    pub expired: Option<bool>,
}

#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    #[error("event {0} not found")]
    NotFound(Uuid),

    #[error("user {actor} is not the organizer of event {event}")]
    NotOrganizer { event: Uuid, actor: Uuid },

    #[error("cannot shrink to {requested} seats: {consumed} already taken")]
    NegativeSeats { requested: i32, consumed: i32 },
}

impl Event {
    pub fn new(organizer_id: Uuid, input: NewEvent, now: DateTime<Utc>) -> Self {
        let mut event = Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            date: input.date,
            time: input.time,
            venue: input.venue,
            organized_by: input.organized_by,
            organizer_id,
            total_seats: input.total_seats,
            available_seats: input.total_seats,
            category: input.category,
            registration_deadline: input.registration_deadline,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
            is_expired: false,
            created_at: now,
            updated_at: now,
        };
        event.refresh_expiry(now.date_naive());
        event
    }

    pub fn consumed_seats(&self) -> i32 {
        self.total_seats - self.available_seats
    }

    pub fn refresh_expiry(&mut self, today: NaiveDate) {
        self.is_expired = self.date < today;
    }

    pub fn matches(&self, filter: &EventFilter) -> bool {
        filter.category.map_or(true, |c| c == self.category)
            && filter.expired.map_or(true, |e| e == self.is_expired)
    }

    pub fn ensure_organizer(&self, actor: Uuid) -> Result<(), EventError> {
        if self.organizer_id == actor {
            Ok(())
        } else {
            Err(EventError::NotOrganizer {
                event: self.id,
                actor,
            })
        }
    }

    /// Apply `patch` on behalf of `actor`, returning the updated event.
    ///
    /// Fails without side effects if `actor` is not the organizer or if the new
    /// capacity is smaller than the seats already taken.
    pub fn apply_patch(
        &self,
        actor: Uuid,
        patch: &EventPatch,
        now: DateTime<Utc>,
    ) -> Result<Event, EventError> {
        self.ensure_organizer(actor)?;

        let mut next = self.clone();

        if let Some(total) = patch.total_seats {
            next.available_seats =
                adjusted_available_seats(self.total_seats, self.available_seats, total).ok_or(
                    EventError::NegativeSeats {
                        requested: total,
                        consumed: self.consumed_seats(),
                    },
                )?;
            next.total_seats = total;
        }

        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(date) = patch.date {
            next.date = date;
        }
        if let Some(time) = &patch.time {
            next.time = time.clone();
        }
        if let Some(venue) = &patch.venue {
            next.venue = venue.clone();
        }
        if let Some(organized_by) = &patch.organized_by {
            next.organized_by = organized_by.clone();
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(deadline) = patch.registration_deadline {
            next.registration_deadline = deadline;
        }
        if let Some(email) = &patch.contact_email {
            next.contact_email = email.clone();
        }
        if let Some(phone) = &patch.contact_phone {
            next.contact_phone = phone.clone();
        }

        next.updated_at = now;
        next.refresh_expiry(now.date_naive());
        Ok(next)
    }
}

/// Resize capacity while keeping consumed seats consumed:
/// `available + (new_total - total)`, or `None` when that would go negative.
pub fn adjusted_available_seats(total: i32, available: i32, new_total: i32) -> Option<i32> {
    let adjusted = i64::from(available) + i64::from(new_total) - i64::from(total);
    if adjusted < 0 {
        return None;
    }
    i32::try_from(adjusted).ok()
}

impl<'r> FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let category: String = row.try_get("category")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
            venue: row.try_get("venue")?,
            organized_by: row.try_get("organized_by")?,
            organizer_id: row.try_get("organizer_id")?,
            total_seats: row.try_get("total_seats")?,
            available_seats: row.try_get("available_seats")?,
            category: category.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            registration_deadline: row.try_get("registration_deadline")?,
            contact_email: row.try_get("contact_email")?,
            contact_phone: row.try_get("contact_phone")?,
            is_expired: row.try_get("is_expired")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
