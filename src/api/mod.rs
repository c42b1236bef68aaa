//! API route definitions

pub mod health;
pub mod status;
pub mod webhooks;
