pub mod event;
pub mod reset_code;
pub mod user;

pub use event::{Event, EventError, EventFilter, EventPatch, NewEvent};
pub use reset_code::{Redemption, ResetCode};
pub use user::{NewUser, User};
