use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MapLocation {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub x_position: f32,
    pub y_position: f32,
    pub kind: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    General,
    Base,
    Gathering,
    Storage,
    Work,
    Hospital,
    Police,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::General => "general",
            LocationKind::Base => "base",
            LocationKind::Gathering => "gathering",
            LocationKind::Storage => "storage",
            LocationKind::Work => "work",
            LocationKind::Hospital => "hospital",
            LocationKind::Police => "police",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RosterMember {
    pub id: Uuid,
    pub name: String,
    pub rank: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GalleryAlbum {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}
