pub mod sqlite_event_repo;
pub mod sqlite_response_store;
pub mod sqlite_user_repo;
pub mod sqlite_group_repo;

pub mod postgres_event_repo;
pub mod postgres_response_store;
pub mod postgres_user_repo;
pub mod postgres_group_repo;
