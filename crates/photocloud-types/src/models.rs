use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A photo as seen by API clients. The image bytes live with the external
/// media service; only the delivery URL and its asset id are kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub title: String,
    pub image_url: String,
    pub public_id: String,
    pub created_at: DateTime<Utc>,
}
