// handlers/protected/mod.rs - Handlers behind JWT authentication
//
// Every route here runs after `event_auth`, which loads the caller from the
// store and rejects students. Handlers read the caller via `Extension<AuthUser>`.

pub mod events;
