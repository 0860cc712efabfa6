//! HTTP handlers for the webhook API.

pub mod configurations;
pub mod deliveries;
