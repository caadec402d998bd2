pub mod json;
pub mod validate;

pub use json::ApiJson;
