use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use photocloud_db::models::PhotoRow;
use photocloud_types::api::{Claims, MessageResponse};
use photocloud_types::models::Photo;

use crate::error::ApiError;
use crate::{AppState, run_db};

/// GET /api/photos/public — every photo, newest first. No auth.
pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<Photo>>, ApiError> {
    let rows = run_db(&state, |db| db.list_photos()).await?;
    Ok(Json(rows.into_iter().map(photo_from_row).collect()))
}

/// GET /api/photos — the caller's photos, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Photo>>, ApiError> {
    let owner = claims.sub.to_string();
    let rows = run_db(&state, move |db| db.list_photos_by_owner(&owner)).await?;
    Ok(Json(rows.into_iter().map(photo_from_row).collect()))
}

/// POST /api/photos/upload — multipart with a `title` text field and an
/// `image` file field. The image goes to the media service first; the record
/// is only written once the service has accepted it.
pub async fn upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<Photo>, ApiError> {
    let mut title: Option<String> = None;
    let mut image: Option<(Bytes, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => title = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                image = Some((data, file_name));
            }
            _ => warn!("Ignoring unknown upload field: {}", field_name),
        }
    }

    let (data, file_name) = image
        .filter(|(data, _)| !data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please upload a file".into()))?;

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please provide a title".into()))?;

    let asset = state
        .media
        .upload(data, file_name)
        .await
        .map_err(|e| ApiError::Upstream("Image upload failed", e))?;

    let photo_id = Uuid::new_v4();
    let id = photo_id.to_string();
    let owner = claims.sub.to_string();
    let public_id = asset.public_id.clone();
    let row = run_db(&state, move |db| {
        db.insert_photo(&id, &owner, &title, &asset.url, &asset.public_id)
    })
    .await
    .inspect_err(|_| error!("Asset {} stored but its record was not saved", public_id))?;

    info!(
        "Photo {} uploaded by {} as {}",
        photo_id, claims.username, row.public_id
    );

    Ok(Json(photo_from_row(row)))
}

/// DELETE /api/photos/{id} — owner only. Removes the remote asset, then the
/// record. The two steps are not atomic.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = photo_id.to_string();
    let photo = run_db(&state, move |db| db.get_photo(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Photo not found".into()))?;

    if photo.owner_id != claims.sub.to_string() {
        warn!(
            "User {} tried to delete photo {} owned by {}",
            claims.sub, photo_id, photo.owner_id
        );
        return Err(ApiError::Forbidden("User not authorized".into()));
    }

    state
        .media
        .destroy(&photo.public_id)
        .await
        .map_err(|e| ApiError::Upstream("Image delete failed", e))?;

    let id = photo_id.to_string();
    let removed = run_db(&state, move |db| db.delete_photo(&id))
        .await
        .inspect_err(|_| error!("Asset {} removed but record {} remains", photo.public_id, photo_id))?;
    if !removed {
        warn!("Photo {} was already gone from the database", photo_id);
    }

    info!("Photo {} deleted by {}", photo_id, claims.username);

    Ok(Json(MessageResponse::new("Photo removed")))
}

fn photo_from_row(row: PhotoRow) -> Photo {
    Photo {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt photo id '{}': {}", row.id, e);
            Uuid::default()
        }),
        owner_id: row.owner_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt owner_id '{}' on photo '{}': {}", row.owner_id, row.id, e);
            Uuid::default()
        }),
        created_at: chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|e| {
                warn!("Corrupt created_at '{}' on photo '{}': {}", row.created_at, row.id, e);
                chrono::DateTime::default()
            }),
        owner_username: row.owner_username,
        title: row.title,
        image_url: row.image_url,
        public_id: row.public_id,
    }
}
