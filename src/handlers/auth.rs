use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    database::Database,
    middleware::{get_current_user, revoke_session},
    models::{LoginRequest, Profile, ProfileResponse},
    utils::{create_token, verify_password},
};

pub async fn login(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<LoginRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, Json<Value>)> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "INVALID_CREDENTIALS", "message": "Invalid username or password" })),
        )
    };

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE username = $1")
        .bind(&form.username)
        .fetch_optional(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to load profile: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "DATABASE_ERROR", "message": "Login failed" })),
            )
        })?
        .ok_or_else(invalid)?;

    let password_ok = verify_password(&form.password, &profile.password_hash).unwrap_or(false);
    if !password_ok {
        return Err(invalid());
    }

    // Session row backs the token: logout or expiry invalidates it server-side.
    let session_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(24);

    sqlx::query("INSERT INTO sessions (id, profile_id, expires_at) VALUES ($1, $2, $3)")
        .bind(session_id)
        .bind(profile.id)
        .bind(expires_at)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to create session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "DATABASE_ERROR", "message": "Login failed" })),
            )
        })?;

    let token = create_token(profile.id, session_id, profile.username.clone()).map_err(|e| {
        log::error!("Failed to create token: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "TOKEN_ERROR", "message": "Login failed" })),
        )
    })?;

    let cookie = Cookie::build(("auth_token", token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(24))
        .build();
    cookies.add(cookie);

    log::info!("{} logged in", profile.username);

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn logout(State(db): State<Database>, cookies: Cookies) -> StatusCode {
    // Drop only the session this token names; other devices stay signed in.
    if let Some(cookie) = cookies.get("auth_token") {
        revoke_session(&db, cookie.value()).await;
    }
    cookies.remove(Cookie::from("auth_token"));
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(db): State<Database>,
    cookies: Cookies,
) -> Result<Json<ProfileResponse>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(user.id)
        .fetch_one(&db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ProfileResponse::from(profile)))
}
