use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TreasuryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

// Stock never moves through item CRUD; only the ledger writes it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TreasuryTransaction {
    pub id: Uuid,
    pub kind: String,
    pub created_by: Option<Uuid>,
    pub notes: Option<String>,
    pub proof_image_urls: Vec<String>,
    pub item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionLineItem {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
        }
    }

    /// Signed stock delta this kind applies for a given line quantity.
    pub fn delta(&self, quantity: i32) -> i32 {
        match self {
            TransactionKind::Deposit => quantity,
            TransactionKind::Withdraw => -quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Weapon,
    Cash,
    Drug,
    Material,
    Other,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Weapon => "weapon",
            ItemCategory::Cash => "cash",
            ItemCategory::Drug => "drug",
            ItemCategory::Material => "material",
            ItemCategory::Other => "other",
        }
    }
}

// Rows fetched for the activity feed before assembly.
#[derive(Debug, Clone, FromRow)]
pub struct FeedTransactionRow {
    pub id: Uuid,
    pub kind: String,
    pub notes: Option<String>,
    pub proof_image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub legacy_item_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FeedLineRow {
    pub transaction_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLine {
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
}

/// One entry of the recent-activity feed, line items and names resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: String,
    pub created_by: Option<String>,
    pub notes: Option<String>,
    pub proof_image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ActivityLine>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryStock {
    pub category: String,
    pub total: i64,
}
