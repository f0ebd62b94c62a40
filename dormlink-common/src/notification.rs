//! Notification records from `GET /notifications/my/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single notification as listed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    /// Optional in-app destination (e.g. a listing or application page).
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}
