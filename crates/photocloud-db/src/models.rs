//! Database row types — these map directly to SQLite rows.
//! Distinct from photocloud-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
}

pub struct PhotoRow {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub title: String,
    pub image_url: String,
    pub public_id: String,
    pub created_at: String,
}
