use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub rank: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Treasurer,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Treasurer => "treasurer",
            Role::Member => "member",
        }
    }

    // Unknown values from the database degrade to the least privilege.
    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            "treasurer" => Role::Treasurer,
            _ => Role::Member,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub rank: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            role: profile.role,
            rank: profile.rank,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
        }
    }
}
