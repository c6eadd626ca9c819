use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    middleware::{get_current_user, CurrentUser},
    models::{GalleryAlbum, LocationKind, MapLocation, RosterMember, Story},
};

async fn require_admin(cookies: Cookies, db: &Database) -> Result<CurrentUser, StatusCode> {
    let user = get_current_user(cookies, db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(user)
}

// Map locations

pub async fn locations_list(
    State(db): State<Database>,
) -> Result<Json<Vec<MapLocation>>, StatusCode> {
    let locations = sqlx::query_as::<_, MapLocation>("SELECT * FROM map_locations ORDER BY name")
        .fetch_all(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to list map locations: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(locations))
}

#[derive(Deserialize)]
pub struct LocationForm {
    name: String,
    description: Option<String>,
    x_position: f32,
    y_position: f32,
    kind: LocationKind,
    image_url: Option<String>,
}

pub async fn create_location(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<LocationForm>,
) -> Result<(StatusCode, Json<MapLocation>), StatusCode> {
    require_admin(cookies, &db).await?;
    if form.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let location = sqlx::query_as::<_, MapLocation>(
        r#"
        INSERT INTO map_locations (name, description, x_position, y_position, kind, image_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(&form.description)
    .bind(form.x_position)
    .bind(form.y_position)
    .bind(form.kind.as_str())
    .bind(&form.image_url)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create map location: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(db): State<Database>,
    cookies: Cookies,
    Path(location_id): Path<Uuid>,
    Json(form): Json<LocationForm>,
) -> Result<Json<MapLocation>, StatusCode> {
    require_admin(cookies, &db).await?;
    if form.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let location = sqlx::query_as::<_, MapLocation>(
        r#"
        UPDATE map_locations
        SET name = $1, description = $2, x_position = $3, y_position = $4, kind = $5, image_url = $6
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(&form.description)
    .bind(form.x_position)
    .bind(form.y_position)
    .bind(form.kind.as_str())
    .bind(&form.image_url)
    .bind(location_id)
    .fetch_optional(&db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(location))
}

pub async fn delete_location(
    State(db): State<Database>,
    cookies: Cookies,
    Path(location_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    require_admin(cookies, &db).await?;

    let result = sqlx::query("DELETE FROM map_locations WHERE id = $1")
        .bind(location_id)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete map location {}: {}", location_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

// Roster

pub async fn roster_list(State(db): State<Database>) -> Result<Json<Vec<RosterMember>>, StatusCode> {
    let members = sqlx::query_as::<_, RosterMember>(
        "SELECT * FROM roster_members ORDER BY sort_order, name",
    )
    .fetch_all(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to list roster: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(members))
}

#[derive(Deserialize)]
pub struct RosterForm {
    name: String,
    rank: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    #[serde(default)]
    sort_order: i32,
}

pub async fn create_member(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<RosterForm>,
) -> Result<(StatusCode, Json<RosterMember>), StatusCode> {
    require_admin(cookies, &db).await?;
    if form.name.trim().is_empty() || form.rank.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let member = sqlx::query_as::<_, RosterMember>(
        r#"
        INSERT INTO roster_members (name, rank, bio, avatar_url, sort_order)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(form.rank.trim())
    .bind(&form.bio)
    .bind(&form.avatar_url)
    .bind(form.sort_order)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create roster member: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(db): State<Database>,
    cookies: Cookies,
    Path(member_id): Path<Uuid>,
    Json(form): Json<RosterForm>,
) -> Result<Json<RosterMember>, StatusCode> {
    require_admin(cookies, &db).await?;
    if form.name.trim().is_empty() || form.rank.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let member = sqlx::query_as::<_, RosterMember>(
        r#"
        UPDATE roster_members
        SET name = $1, rank = $2, bio = $3, avatar_url = $4, sort_order = $5
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(form.rank.trim())
    .bind(&form.bio)
    .bind(&form.avatar_url)
    .bind(form.sort_order)
    .bind(member_id)
    .fetch_optional(&db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(member))
}

pub async fn delete_member(
    State(db): State<Database>,
    cookies: Cookies,
    Path(member_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    require_admin(cookies, &db).await?;

    let result = sqlx::query("DELETE FROM roster_members WHERE id = $1")
        .bind(member_id)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete roster member {}: {}", member_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

// Stories

pub async fn stories_list(State(db): State<Database>) -> Result<Json<Vec<Story>>, StatusCode> {
    let stories = sqlx::query_as::<_, Story>("SELECT * FROM stories ORDER BY created_at DESC")
        .fetch_all(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to list stories: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(stories))
}

#[derive(Deserialize)]
pub struct StoryForm {
    title: String,
    content: String,
    image_url: Option<String>,
}

pub async fn create_story(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<StoryForm>,
) -> Result<(StatusCode, Json<Story>), StatusCode> {
    require_admin(cookies, &db).await?;
    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let story = sqlx::query_as::<_, Story>(
        "INSERT INTO stories (title, content, image_url) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(form.title.trim())
    .bind(&form.content)
    .bind(&form.image_url)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create story: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn update_story(
    State(db): State<Database>,
    cookies: Cookies,
    Path(story_id): Path<Uuid>,
    Json(form): Json<StoryForm>,
) -> Result<Json<Story>, StatusCode> {
    require_admin(cookies, &db).await?;
    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let story = sqlx::query_as::<_, Story>(
        "UPDATE stories SET title = $1, content = $2, image_url = $3 WHERE id = $4 RETURNING *",
    )
    .bind(form.title.trim())
    .bind(&form.content)
    .bind(&form.image_url)
    .bind(story_id)
    .fetch_optional(&db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(story))
}

pub async fn delete_story(
    State(db): State<Database>,
    cookies: Cookies,
    Path(story_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    require_admin(cookies, &db).await?;

    let result = sqlx::query("DELETE FROM stories WHERE id = $1")
        .bind(story_id)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete story {}: {}", story_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

// Gallery albums

pub async fn gallery_list(State(db): State<Database>) -> Result<Json<Vec<GalleryAlbum>>, StatusCode> {
    let albums =
        sqlx::query_as::<_, GalleryAlbum>("SELECT * FROM gallery_albums ORDER BY created_at DESC")
            .fetch_all(&db)
            .await
            .map_err(|e| {
                log::error!("Failed to list gallery albums: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
    Ok(Json(albums))
}

#[derive(Deserialize)]
pub struct AlbumForm {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    image_urls: Vec<String>,
}

pub async fn create_album(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<AlbumForm>,
) -> Result<(StatusCode, Json<GalleryAlbum>), StatusCode> {
    require_admin(cookies, &db).await?;
    if form.image_urls.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let album = sqlx::query_as::<_, GalleryAlbum>(
        "INSERT INTO gallery_albums (title, description, image_urls) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.image_urls)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create gallery album: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(album)))
}

pub async fn update_album(
    State(db): State<Database>,
    cookies: Cookies,
    Path(album_id): Path<Uuid>,
    Json(form): Json<AlbumForm>,
) -> Result<Json<GalleryAlbum>, StatusCode> {
    require_admin(cookies, &db).await?;
    if form.image_urls.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let album = sqlx::query_as::<_, GalleryAlbum>(
        r#"
        UPDATE gallery_albums
        SET title = $1, description = $2, image_urls = $3
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.image_urls)
    .bind(album_id)
    .fetch_optional(&db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(album))
}

pub async fn delete_album(
    State(db): State<Database>,
    cookies: Cookies,
    Path(album_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    require_admin(cookies, &db).await?;

    let result = sqlx::query("DELETE FROM gallery_albums WHERE id = $1")
        .bind(album_id)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete gallery album {}: {}", album_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
