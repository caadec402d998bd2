// Routes that need no credential: account entry points and event browsing

pub mod auth;
pub mod events;
