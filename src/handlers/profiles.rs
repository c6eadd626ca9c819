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
    middleware::get_current_user,
    models::{Profile, ProfileResponse, Role},
    utils::hash_password,
};

pub async fn profiles_list(
    State(db): State<Database>,
    cookies: Cookies,
) -> Result<Json<Vec<ProfileResponse>>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let profiles = sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY username")
        .fetch_all(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to list profiles: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

#[derive(Deserialize)]
pub struct CreateProfileForm {
    username: String,
    password: String,
    role: Role,
    rank: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
}

pub async fn create_profile(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<CreateProfileForm>,
) -> Result<(StatusCode, Json<ProfileResponse>), StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    if form.username.trim().is_empty() || form.password.len() < 8 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let password_hash = hash_password(&form.password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (username, password_hash, role, rank, bio, avatar_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(form.username.trim())
    .bind(&password_hash)
    .bind(form.role.as_str())
    .bind(&form.rank)
    .bind(&form.bio)
    .bind(&form.avatar_url)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create profile: {}", e);
        // Unique violation on username is the common case here.
        StatusCode::CONFLICT
    })?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

#[derive(Deserialize)]
pub struct UpdateProfileForm {
    role: Role,
    rank: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
}

pub async fn update_profile(
    State(db): State<Database>,
    cookies: Cookies,
    Path(profile_id): Path<Uuid>,
    Json(form): Json<UpdateProfileForm>,
) -> Result<Json<ProfileResponse>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    // An admin cannot demote their own account; someone else has to.
    if profile_id == user.id && form.role != Role::Admin {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
        SET role = $1, rank = $2, bio = $3, avatar_url = $4, updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(form.role.as_str())
    .bind(&form.rank)
    .bind(&form.bio)
    .bind(&form.avatar_url)
    .bind(profile_id)
    .fetch_optional(&db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn delete_profile(
    State(db): State<Database>,
    cookies: Cookies,
    Path(profile_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    if profile_id == user.id {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(profile_id)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete profile {}: {}", profile_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
