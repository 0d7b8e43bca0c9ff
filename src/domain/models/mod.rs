pub mod event;
pub mod notification;
pub mod response;
pub mod user;
