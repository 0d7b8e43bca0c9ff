pub mod access;
pub mod admission;
pub mod event_locks;
pub mod event_service;
pub mod notification_service;
pub mod rsvp_service;
