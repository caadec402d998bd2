// handlers/elevated/mod.rs - Administrative handlers (Admin role required)
//
// Routes here run after `admin_auth`, which checks the caller's stored role.

pub mod change_role;

pub use change_role::change_role;
