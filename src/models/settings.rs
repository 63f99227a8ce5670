use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Singleton store profile, auto-created with defaults on first read.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: Uuid,
    pub business_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub receipt_footer: String,
    pub updated_at: DateTime<Utc>,
}
