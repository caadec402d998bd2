pub mod account_service;
pub mod notifier;

pub use account_service::{AccountError, AccountService, Session};
pub use notifier::{DeliveryError, LogNotifier, ResetCodeNotifier};
