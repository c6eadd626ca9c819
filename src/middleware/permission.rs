use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    models::{Profile, Role},
    utils::verify_token,
};

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub rank: Option<String>,
    pub avatar_url: Option<String>,
}

impl CurrentUser {
    pub fn from_profile(profile: Profile) -> Self {
        let role = Role::parse(&profile.role);
        Self {
            id: profile.id,
            username: profile.username,
            role,
            rank: profile.rank,
            avatar_url: profile.avatar_url,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    // Deposits and treasury item administration need treasurer privileges or above.
    pub fn can_manage_treasury(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Treasurer)
    }
}

/// Resolves the cookie token to a profile. The token alone is not enough: its
/// session id must still exist and be unexpired in the sessions table, so access
/// is always a server-side decision, never a client-held flag.
pub async fn get_current_user(cookies: Cookies, db: &Database) -> Option<CurrentUser> {
    let token = cookies.get("auth_token")?.value().to_string();

    let claims = verify_token(&token).ok()?;

    let profile_id = Uuid::parse_str(&claims.sub).ok()?;
    let session_id = Uuid::parse_str(&claims.sid).ok()?;

    let session_valid = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE id = $1 AND profile_id = $2 AND expires_at > NOW()",
    )
    .bind(session_id)
    .bind(profile_id)
    .fetch_one(db)
    .await
    .ok()?;

    if session_valid == 0 {
        return None;
    }

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(profile_id)
        .fetch_optional(db)
        .await
        .ok()??;

    Some(CurrentUser::from_profile(profile))
}

/// Deletes the single session a token names, leaving the profile's other
/// sessions valid. Returns whether a session row was removed.
pub async fn revoke_session(db: &Database, token: &str) -> bool {
    let claims = match verify_token(token) {
        Ok(claims) => claims,
        Err(_) => return false,
    };
    let session_id = match Uuid::parse_str(&claims.sid) {
        Ok(id) => id,
        Err(_) => return false,
    };

    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(db)
        .await
        .map(|result| result.rows_affected() > 0)
        .unwrap_or(false)
}
