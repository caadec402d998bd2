// Organizer-facing event mutations. All routes here sit behind `event_auth`.

use serde::Deserialize;
use serde_json::Value;

use crate::api::validate::{
    as_int, is_email, is_event_time, is_phone, parse_date, parse_timestamp, FieldErrors,
};
use crate::database::models::{EventPatch, NewEvent};
use crate::error::ApiError;
use crate::types::Category;

pub mod create;
pub mod delete;
pub mod update;

pub use create::create;
pub use delete::delete;
pub use update::update;

const NAME: (&str, &str) = ("name", "Event name is required");
const DESCRIPTION: (&str, &str) = ("description", "Description is required");
const DATE: (&str, &str) = ("date", "Valid date is required");
const TIME: (&str, &str) = ("time", "Valid time is required (HH:MM or HH:MM AM/PM)");
const VENUE: (&str, &str) = ("venue", "Venue is required");
const ORGANIZED_BY: (&str, &str) = ("organizedBy", "Organizer name is required");
const TOTAL_SEATS: (&str, &str) = ("totalSeats", "Total seats must be at least 1");
const CATEGORY: (&str, &str) = ("category", "Valid category is required");
const DEADLINE: (&str, &str) = ("registrationDeadline", "Valid registration deadline is required");
const CONTACT_EMAIL: (&str, &str) = ("contactEmail", "Valid contact email is required");
const CONTACT_PHONE: (&str, &str) = ("contactPhone", "Valid contact phone is required");

/// Event body shared by create and update. Fields the client may not set
/// (`availableSeats`, `organizerId`) are not part of it and are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub organized_by: Option<String>,
    pub total_seats: Option<Value>,
    pub category: Option<String>,
    pub registration_deadline: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl EventPayload {
    /// Full validation for creation: every field is required
    pub fn into_new_event(self) -> Result<NewEvent, ApiError> {
        let mut errors = FieldErrors::new();
        self.require_all(&mut errors);
        let patch = self.parse(&mut errors);
        errors.into_result()?;

        let EventPatch {
            name: Some(name),
            description: Some(description),
            date: Some(date),
            time: Some(time),
            venue: Some(venue),
            organized_by: Some(organized_by),
            total_seats: Some(total_seats),
            category: Some(category),
            registration_deadline: Some(registration_deadline),
            contact_email: Some(contact_email),
            contact_phone: Some(contact_phone),
        } = patch
        else {
            return Err(ApiError::validation_error("Validation failed", None));
        };

        Ok(NewEvent {
            name,
            description,
            date,
            time,
            venue,
            organized_by,
            total_seats,
            category,
            registration_deadline,
            contact_email,
            contact_phone,
        })
    }

    /// Partial validation for updates: only present fields are checked and applied
    pub fn into_patch(self) -> Result<EventPatch, ApiError> {
        let mut errors = FieldErrors::new();
        let patch = self.parse(&mut errors);
        errors.into_result()?;
        Ok(patch)
    }

    fn require_all(&self, errors: &mut FieldErrors) {
        let present = [
            (self.name.is_some(), NAME),
            (self.description.is_some(), DESCRIPTION),
            (self.date.is_some(), DATE),
            (self.time.is_some(), TIME),
            (self.venue.is_some(), VENUE),
            (self.organized_by.is_some(), ORGANIZED_BY),
            (self.total_seats.is_some(), TOTAL_SEATS),
            (self.category.is_some(), CATEGORY),
            (self.registration_deadline.is_some(), DEADLINE),
            (self.contact_email.is_some(), CONTACT_EMAIL),
            (self.contact_phone.is_some(), CONTACT_PHONE),
        ];
        for (is_present, (field, message)) in present {
            errors.check(is_present, field, message);
        }
    }

    /// Validate every present field, recording failures and returning the valid ones
    fn parse(&self, errors: &mut FieldErrors) -> EventPatch {
        EventPatch {
            name: text(&self.name, NAME, errors),
            description: text(&self.description, DESCRIPTION, errors),
            date: checked(&self.date, DATE, errors, |s| parse_date(s)),
            time: checked(&self.time, TIME, errors, |s| {
                is_event_time(s).then(|| s.trim().to_string())
            }),
            venue: text(&self.venue, VENUE, errors),
            organized_by: text(&self.organized_by, ORGANIZED_BY, errors),
            total_seats: self.total_seats.as_ref().and_then(|raw| {
                let seats = as_int(raw)
                    .filter(|n| *n >= 1)
                    .and_then(|n| i32::try_from(n).ok());
                if seats.is_none() {
                    errors.add(TOTAL_SEATS.0, TOTAL_SEATS.1);
                }
                seats
            }),
            category: checked(&self.category, CATEGORY, errors, |s| s.parse::<Category>().ok()),
            registration_deadline: checked(&self.registration_deadline, DEADLINE, errors, |s| {
                parse_timestamp(s)
            }),
            contact_email: checked(&self.contact_email, CONTACT_EMAIL, errors, |s| {
                is_email(s).then(|| s.trim().to_lowercase())
            }),
            contact_phone: checked(&self.contact_phone, CONTACT_PHONE, errors, |s| {
                is_phone(s).then(|| s.to_string())
            }),
        }
    }
}

fn text(value: &Option<String>, rule: (&str, &str), errors: &mut FieldErrors) -> Option<String> {
    checked(value, rule, errors, |s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn checked<T>(
    value: &Option<String>,
    (field, message): (&str, &str),
    errors: &mut FieldErrors,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let parsed = parse(value.as_deref()?);
    if parsed.is_none() {
        errors.add(field, message);
    }
    parsed
}
