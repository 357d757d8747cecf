use crate::Database;
use crate::models::{PhotoRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

const PHOTO_COLUMNS: &str =
    "p.id, p.owner_id, u.username, p.title, p.image_url, p.public_id, p.created_at";

impl Database {
    // -- Users --

    /// Returns false when the username is already taken. The uniqueness check
    /// and the insert are one statement, so concurrent callers cannot both win.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO NOTHING",
                (id, username, password_hash),
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, username, password FROM users WHERE username = ?1")?;
            let row = stmt
                .query_row([username], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    // -- Photos --

    /// Insert a photo record and read it back with its server-assigned
    /// `created_at` and the owner's username.
    pub fn insert_photo(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        image_url: &str,
        public_id: &str,
    ) -> Result<PhotoRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO photos (id, owner_id, title, image_url, public_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, owner_id, title, image_url, public_id],
            )?;
            query_photo(conn, id)?.ok_or_else(|| anyhow!("Photo vanished after insert: {}", id))
        })
    }

    pub fn get_photo(&self, id: &str) -> Result<Option<PhotoRow>> {
        self.with_conn(|conn| query_photo(conn, id))
    }

    /// Every photo, newest first.
    pub fn list_photos(&self) -> Result<Vec<PhotoRow>> {
        self.with_conn(|conn| query_photos(conn, None))
    }

    /// Photos belonging to one owner, newest first.
    pub fn list_photos_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRow>> {
        self.with_conn(|conn| query_photos(conn, Some(owner_id)))
    }

    /// Returns false when no row matched.
    pub fn delete_photo(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM photos WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn map_photo(row: &rusqlite::Row<'_>) -> rusqlite::Result<PhotoRow> {
    Ok(PhotoRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        title: row.get(3)?,
        image_url: row.get(4)?,
        public_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_photo(conn: &Connection, id: &str) -> Result<Option<PhotoRow>> {
    let sql = format!(
        "SELECT {} FROM photos p LEFT JOIN users u ON p.owner_id = u.id WHERE p.id = ?1",
        PHOTO_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row([id], map_photo).optional()?)
}

fn query_photos(conn: &Connection, owner_id: Option<&str>) -> Result<Vec<PhotoRow>> {
    // rowid breaks ties between photos created within the same millisecond
    let sql = format!(
        "SELECT {} FROM photos p
         LEFT JOIN users u ON p.owner_id = u.id
         WHERE ?1 IS NULL OR p.owner_id = ?1
         ORDER BY p.created_at DESC, p.rowid DESC",
        PHOTO_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([owner_id], map_photo)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
