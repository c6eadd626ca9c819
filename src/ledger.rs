//! Treasury ledger: the single write path for stock and the read views over it.
//!
//! Every deposit and withdrawal, whether it comes from the admin pages or the member
//! withdrawal form, goes through `apply_transaction`. The procedure validates the
//! request, re-reads stock under row locks inside one database transaction, and
//! either applies every write or none of them. Stock is never mutated anywhere else.

use std::collections::{HashMap, HashSet};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    database::Database,
    models::{
        ActivityEntry, ActivityLine, CategoryStock, FeedLineRow, FeedTransactionRow,
        TransactionKind, TransactionLineItem, TreasuryItem, TreasuryTransaction,
    },
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction must contain at least one line item")]
    EmptyTransaction,

    #[error("quantity must be a positive integer, got {quantity}")]
    InvalidQuantity { quantity: i32 },

    #[error("item {item_id} appears more than once in one transaction")]
    DuplicateItem { item_id: Uuid },

    #[error("item {item_id} not found")]
    ItemNotFound { item_id: Uuid },

    #[error("insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::EmptyTransaction => "EMPTY_TRANSACTION",
            LedgerError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            LedgerError::DuplicateItem { .. } => "DUPLICATE_ITEM",
            LedgerError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            LedgerError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            LedgerError::Database(_) => "DATABASE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            LedgerError::EmptyTransaction
            | LedgerError::InvalidQuantity { .. }
            | LedgerError::DuplicateItem { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::InsufficientStock { .. } => StatusCode::CONFLICT,
            LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        if let LedgerError::Database(ref e) = self {
            log::error!("ledger database error: {}", e);
        }
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineRequest {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub lines: Vec<LineRequest>,
    pub notes: Option<String>,
    #[serde(default)]
    pub proof_image_urls: Vec<String>,
}

/// Request-shape checks that need no database access: non-empty, positive integer
/// quantities, no item referenced twice (callers must pre-merge duplicate lines).
pub fn validate_lines(lines: &[LineRequest]) -> Result<(), LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::EmptyTransaction);
    }
    let mut seen = HashSet::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(LedgerError::InvalidQuantity {
                quantity: line.quantity,
            });
        }
        if !seen.insert(line.item_id) {
            return Err(LedgerError::DuplicateItem {
                item_id: line.item_id,
            });
        }
    }
    Ok(())
}

/// All-or-nothing stock check against freshly read `(name, stock)` rows. Runs before
/// any mutation; a single failing line rejects the whole request.
pub fn check_stock(
    kind: TransactionKind,
    lines: &[LineRequest],
    current: &HashMap<Uuid, (String, i32)>,
) -> Result<(), LedgerError> {
    for line in lines {
        let (name, stock) = current
            .get(&line.item_id)
            .ok_or(LedgerError::ItemNotFound {
                item_id: line.item_id,
            })?;
        if kind == TransactionKind::Withdraw && line.quantity > *stock {
            return Err(LedgerError::InsufficientStock {
                name: name.clone(),
                requested: line.quantity,
                available: *stock,
            });
        }
    }
    Ok(())
}

/// A committed transaction together with the line items it produced.
#[derive(Debug, Serialize)]
pub struct AppliedTransaction {
    #[serde(flatten)]
    pub transaction: TreasuryTransaction,
    pub lines: Vec<TransactionLineItem>,
}

/// The Stock Adjustment Procedure. Writes the transaction row, its line items, and
/// the per-item stock deltas inside one database transaction. Stock is re-read with
/// `FOR UPDATE` at execution time, so two concurrent withdrawals against the same
/// item serialize and the loser sees the already-decremented count.
pub async fn apply_transaction(
    db: &Database,
    created_by: Uuid,
    request: &TransactionRequest,
) -> Result<AppliedTransaction, LedgerError> {
    validate_lines(&request.lines)?;

    let item_ids: Vec<Uuid> = request.lines.iter().map(|l| l.item_id).collect();

    let mut txn = db.begin().await?;

    let rows = sqlx::query_as::<_, (Uuid, String, i32)>(
        "SELECT id, name, stock FROM treasury_items WHERE id = ANY($1) FOR UPDATE",
    )
    .bind(&item_ids)
    .fetch_all(&mut *txn)
    .await?;

    let current: HashMap<Uuid, (String, i32)> = rows
        .into_iter()
        .map(|(id, name, stock)| (id, (name, stock)))
        .collect();

    check_stock(request.kind, &request.lines, &current)?;

    let transaction = sqlx::query_as::<_, TreasuryTransaction>(
        r#"
        INSERT INTO treasury_transactions (kind, created_by, notes, proof_image_urls)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(request.kind.as_str())
    .bind(created_by)
    .bind(&request.notes)
    .bind(&request.proof_image_urls)
    .fetch_one(&mut *txn)
    .await?;

    let mut lines = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        let inserted = sqlx::query_as::<_, TransactionLineItem>(
            r#"
            INSERT INTO treasury_transaction_items (transaction_id, item_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(line.item_id)
        .bind(line.quantity)
        .fetch_one(&mut *txn)
        .await?;
        lines.push(inserted);

        sqlx::query("UPDATE treasury_items SET stock = stock + $1 WHERE id = $2")
            .bind(request.kind.delta(line.quantity))
            .bind(line.item_id)
            .execute(&mut *txn)
            .await?;
    }

    txn.commit().await?;

    log::info!(
        "{} transaction {} applied across {} item(s)",
        transaction.kind,
        transaction.id,
        lines.len()
    );

    Ok(AppliedTransaction { transaction, lines })
}

pub async fn list_items(db: &Database) -> Result<Vec<TreasuryItem>, sqlx::Error> {
    sqlx::query_as::<_, TreasuryItem>("SELECT * FROM treasury_items ORDER BY name")
        .fetch_all(db)
        .await
}

/// Per-category stock totals, feeding the distribution chart.
pub async fn stock_distribution(db: &Database) -> Result<Vec<CategoryStock>, sqlx::Error> {
    sqlx::query_as::<_, CategoryStock>(
        r#"
        SELECT category, COALESCE(SUM(stock), 0) AS total
        FROM treasury_items
        GROUP BY category
        ORDER BY category
        "#,
    )
    .fetch_all(db)
    .await
}

/// The most recent `limit` transactions, newest first, with line items and item
/// names resolved.
pub async fn recent_transactions(
    db: &Database,
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let transactions = sqlx::query_as::<_, FeedTransactionRow>(
        r#"
        SELECT t.id, t.kind, t.notes, t.proof_image_urls, t.created_at,
               p.username AS created_by,
               t.item_id, t.quantity, li.name AS legacy_item_name
        FROM treasury_transactions t
        LEFT JOIN profiles p ON p.id = t.created_by
        LEFT JOIN treasury_items li ON li.id = t.item_id
        ORDER BY t.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;

    let transaction_ids: Vec<Uuid> = transactions.iter().map(|t| t.id).collect();

    let lines = sqlx::query_as::<_, FeedLineRow>(
        r#"
        SELECT tl.transaction_id, tl.item_id, tl.quantity, i.name AS item_name
        FROM treasury_transaction_items tl
        JOIN treasury_items i ON i.id = tl.item_id
        WHERE tl.transaction_id = ANY($1)
        "#,
    )
    .bind(&transaction_ids)
    .fetch_all(db)
    .await?;

    Ok(assemble_feed(transactions, lines))
}

/// Joins fetched transaction and line rows into feed entries, preserving the
/// transaction order. A transaction with no line rows but a legacy item_id/quantity
/// pair gets a single synthesized line; new writes always carry line items.
pub fn assemble_feed(
    transactions: Vec<FeedTransactionRow>,
    lines: Vec<FeedLineRow>,
) -> Vec<ActivityEntry> {
    let mut by_transaction: HashMap<Uuid, Vec<ActivityLine>> = HashMap::new();
    for line in lines {
        by_transaction
            .entry(line.transaction_id)
            .or_default()
            .push(ActivityLine {
                item_id: line.item_id,
                item_name: line.item_name,
                quantity: line.quantity,
            });
    }

    transactions
        .into_iter()
        .map(|t| {
            let mut entry_lines = by_transaction.remove(&t.id).unwrap_or_default();
            if entry_lines.is_empty() {
                if let (Some(item_id), Some(quantity)) = (t.item_id, t.quantity) {
                    entry_lines.push(ActivityLine {
                        item_id,
                        item_name: t.legacy_item_name.unwrap_or_default(),
                        quantity,
                    });
                }
            }
            ActivityEntry {
                id: t.id,
                kind: t.kind,
                created_by: t.created_by,
                notes: t.notes,
                proof_image_urls: t.proof_image_urls,
                created_at: t.created_at,
                lines: entry_lines,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn line(item_id: Uuid, quantity: i32) -> LineRequest {
        LineRequest { item_id, quantity }
    }

    #[test]
    fn validate_rejects_empty_request() {
        let err = validate_lines(&[]).unwrap_err();
        assert_eq!(err.code(), "EMPTY_TRANSACTION");
    }

    #[test]
    fn validate_rejects_non_positive_quantities() {
        let id = Uuid::new_v4();
        assert_eq!(
            validate_lines(&[line(id, 0)]).unwrap_err().code(),
            "INVALID_QUANTITY"
        );
        assert_eq!(
            validate_lines(&[line(id, -3)]).unwrap_err().code(),
            "INVALID_QUANTITY"
        );
    }

    #[test]
    fn validate_rejects_duplicate_items() {
        let id = Uuid::new_v4();
        let err = validate_lines(&[line(id, 2), line(Uuid::new_v4(), 1), line(id, 5)]).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_ITEM");
    }

    #[test]
    fn validate_accepts_distinct_positive_lines() {
        assert!(validate_lines(&[line(Uuid::new_v4(), 1), line(Uuid::new_v4(), 40)]).is_ok());
    }

    fn stocks(entries: &[(Uuid, &str, i32)]) -> HashMap<Uuid, (String, i32)> {
        entries
            .iter()
            .map(|(id, name, stock)| (*id, (name.to_string(), *stock)))
            .collect()
    }

    #[test]
    fn withdraw_exceeding_stock_is_rejected() {
        let id = Uuid::new_v4();
        let current = stocks(&[(id, "AK-47", 6)]);
        let err = check_stock(TransactionKind::Withdraw, &[line(id, 10)], &current).unwrap_err();
        match err {
            LedgerError::InsufficientStock {
                ref name,
                requested,
                available,
            } => {
                assert_eq!(name, "AK-47");
                assert_eq!(requested, 10);
                assert_eq!(available, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn withdraw_within_stock_passes_and_one_bad_line_rejects_all() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let current = stocks(&[(a, "Bandage", 10), (b, "Pistol", 2)]);
        assert!(check_stock(
            TransactionKind::Withdraw,
            &[line(a, 4), line(b, 2)],
            &current
        )
        .is_ok());
        // One short line fails the whole request even though the other fits.
        let err = check_stock(
            TransactionKind::Withdraw,
            &[line(a, 4), line(b, 3)],
            &current,
        )
        .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn deposit_ignores_current_stock() {
        let id = Uuid::new_v4();
        let current = stocks(&[(id, "Cash", 0)]);
        assert!(check_stock(TransactionKind::Deposit, &[line(id, 500)], &current).is_ok());
    }

    #[test]
    fn unknown_item_is_reported() {
        let missing = Uuid::new_v4();
        let err = check_stock(TransactionKind::Withdraw, &[line(missing, 1)], &stocks(&[]))
            .unwrap_err();
        assert_eq!(err.code(), "ITEM_NOT_FOUND");
    }

    #[test]
    fn kind_delta_signs() {
        assert_eq!(TransactionKind::Deposit.delta(7), 7);
        assert_eq!(TransactionKind::Withdraw.delta(7), -7);
    }

    #[test]
    fn stock_tracks_ledger_over_a_sequence() {
        // Drive the validation + delta pipeline over a deposit/withdraw sequence and
        // assert the invariant: stock equals deposits minus withdrawals and never
        // goes negative, with rejected requests leaving it untouched.
        let item = Uuid::new_v4();
        let mut stock = 0i32;
        let mut deposits = 0i32;
        let mut withdrawals = 0i32;

        let ops = [
            (TransactionKind::Deposit, 10, true),
            (TransactionKind::Withdraw, 4, true),
            (TransactionKind::Withdraw, 10, false), // only 6 left
            (TransactionKind::Deposit, 2, true),
            (TransactionKind::Withdraw, 8, true),
            (TransactionKind::Withdraw, 1, false), // empty now
        ];

        for (kind, quantity, should_succeed) in ops {
            let lines = [line(item, quantity)];
            let current = stocks(&[(item, "Crate", stock)]);
            let result =
                validate_lines(&lines).and_then(|_| check_stock(kind, &lines, &current));
            assert_eq!(result.is_ok(), should_succeed);
            if result.is_ok() {
                stock += kind.delta(quantity);
                match kind {
                    TransactionKind::Deposit => deposits += quantity,
                    TransactionKind::Withdraw => withdrawals += quantity,
                }
            }
            assert_eq!(stock, deposits - withdrawals);
            assert!(stock >= 0);
        }
        assert_eq!(stock, 0);
    }

    fn feed_row(id: Uuid, kind: &str) -> FeedTransactionRow {
        FeedTransactionRow {
            id,
            kind: kind.to_string(),
            notes: None,
            proof_image_urls: vec![],
            created_at: Utc::now(),
            created_by: Some("ghost".to_string()),
            item_id: None,
            quantity: None,
            legacy_item_name: None,
        }
    }

    #[test]
    fn feed_preserves_transaction_order_and_groups_lines() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let item = Uuid::new_v4();
        let lines = vec![
            FeedLineRow {
                transaction_id: second,
                item_id: item,
                item_name: "Rope".to_string(),
                quantity: 3,
            },
            FeedLineRow {
                transaction_id: first,
                item_id: item,
                item_name: "Rope".to_string(),
                quantity: 1,
            },
        ];
        let feed = assemble_feed(vec![feed_row(first, "WITHDRAW"), feed_row(second, "DEPOSIT")], lines);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, first);
        assert_eq!(feed[0].lines.len(), 1);
        assert_eq!(feed[0].lines[0].quantity, 1);
        assert_eq!(feed[1].id, second);
        assert_eq!(feed[1].lines[0].quantity, 3);
    }

    #[test]
    fn feed_falls_back_to_legacy_single_item_shape() {
        let id = Uuid::new_v4();
        let item = Uuid::new_v4();
        let mut row = feed_row(id, "DEPOSIT");
        row.item_id = Some(item);
        row.quantity = Some(12);
        row.legacy_item_name = Some("Gold Bar".to_string());

        let feed = assemble_feed(vec![row], vec![]);
        assert_eq!(feed[0].lines.len(), 1);
        assert_eq!(feed[0].lines[0].item_id, item);
        assert_eq!(feed[0].lines[0].item_name, "Gold Bar");
        assert_eq!(feed[0].lines[0].quantity, 12);
    }

    #[test]
    fn feed_entry_without_lines_or_legacy_shape_stays_empty() {
        let feed = assemble_feed(vec![feed_row(Uuid::new_v4(), "WITHDRAW")], vec![]);
        assert!(feed[0].lines.is_empty());
    }
}
