use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(full_name: String, email: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name,
            email: email.filter(|e| !e.is_empty()),
            created_at: Utc::now(),
        }
    }
}
