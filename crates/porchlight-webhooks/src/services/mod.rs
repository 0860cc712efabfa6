//! Business logic services for the webhook system.

pub mod configuration_service;
pub mod delivery_service;
pub mod event_publisher;
pub mod executor;
