//! Session lifecycle against a real database (sqlx test harness, needs
//! `DATABASE_URL`).

use chrono::{Duration, Utc};
use faction_portal::middleware::revoke_session;
use faction_portal::utils::create_token;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_profile(pool: &PgPool) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO profiles (username, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("ghost")
    .bind("not-a-real-hash")
    .bind("member")
    .fetch_one(pool)
    .await
    .expect("seed profile")
}

async fn seed_session(pool: &PgPool, profile_id: Uuid) -> Uuid {
    let session_id = Uuid::new_v4();
    sqlx::query("INSERT INTO sessions (id, profile_id, expires_at) VALUES ($1, $2, $3)")
        .bind(session_id)
        .bind(profile_id)
        .bind(Utc::now() + Duration::hours(1))
        .execute(pool)
        .await
        .expect("seed session");
    session_id
}

async fn session_exists(pool: &PgPool, session_id: Uuid) -> bool {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE id = $1")
        .bind(session_id)
        .fetch_one(pool)
        .await
        .expect("count sessions")
        > 0
}

#[sqlx::test]
async fn revoking_one_session_leaves_other_devices_signed_in(pool: PgPool) {
    std::env::set_var("JWT_SECRET", "test-secret");

    let profile = seed_profile(&pool).await;
    let laptop = seed_session(&pool, profile).await;
    let phone = seed_session(&pool, profile).await;

    let token = create_token(profile, laptop, "ghost".to_string()).expect("create token");

    assert!(revoke_session(&pool, &token).await);
    assert!(!session_exists(&pool, laptop).await);
    assert!(session_exists(&pool, phone).await);

    // The same token revoked twice is a no-op.
    assert!(!revoke_session(&pool, &token).await);
}

#[sqlx::test]
async fn garbage_tokens_revoke_nothing(pool: PgPool) {
    std::env::set_var("JWT_SECRET", "test-secret");

    let profile = seed_profile(&pool).await;
    let session = seed_session(&pool, profile).await;

    assert!(!revoke_session(&pool, "not-a-token").await);
    assert!(session_exists(&pool, session).await);
}
