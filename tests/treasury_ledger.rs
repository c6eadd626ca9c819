//! Database-backed ledger tests: atomicity and row-lock serialization of the
//! stock adjustment path. Each test gets its own migrated database from the
//! sqlx test harness (requires `DATABASE_URL` to point at a Postgres server).

use faction_portal::ledger::{apply_transaction, LineRequest, TransactionRequest};
use faction_portal::models::TransactionKind;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_profile(pool: &PgPool) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO profiles (username, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind("quartermaster")
    .bind("not-a-real-hash")
    .bind("treasurer")
    .fetch_one(pool)
    .await
    .expect("seed profile")
}

async fn seed_item(pool: &PgPool, name: &str, stock: i32) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO treasury_items (name, category, stock) VALUES ($1, 'other', $2) RETURNING id",
    )
    .bind(name)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("seed item")
}

async fn stock_of(pool: &PgPool, item_id: Uuid) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT stock FROM treasury_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .expect("read stock")
}

async fn count(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .expect("count rows")
}

fn withdraw(lines: Vec<LineRequest>) -> TransactionRequest {
    TransactionRequest {
        kind: TransactionKind::Withdraw,
        lines,
        notes: None,
        proof_image_urls: vec![],
    }
}

fn line(item_id: Uuid, quantity: i32) -> LineRequest {
    LineRequest { item_id, quantity }
}

#[sqlx::test]
async fn withdraw_decrements_stock_and_records_the_ledger(pool: PgPool) {
    let profile = seed_profile(&pool).await;
    let item = seed_item(&pool, "Crate", 10).await;

    let applied = apply_transaction(&pool, profile, &withdraw(vec![line(item, 4)]))
        .await
        .expect("withdraw within stock");
    assert_eq!(applied.lines.len(), 1);
    assert_eq!(applied.lines[0].quantity, 4);
    assert_eq!(stock_of(&pool, item).await, 6);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM treasury_transactions").await, 1);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM treasury_transaction_items").await,
        1
    );

    // A follow-up withdrawal beyond the remaining stock is rejected and changes nothing.
    let err = apply_transaction(&pool, profile, &withdraw(vec![line(item, 10)]))
        .await
        .expect_err("oversized withdraw");
    assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    assert_eq!(stock_of(&pool, item).await, 6);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM treasury_transactions").await, 1);
}

#[sqlx::test]
async fn rejected_multi_line_withdraw_writes_nothing(pool: PgPool) {
    let profile = seed_profile(&pool).await;
    let bandages = seed_item(&pool, "Bandage", 6).await;
    let pistols = seed_item(&pool, "Pistol", 10).await;

    // The second line is short, so the whole request must leave no trace: no
    // transaction row, no line rows, both stocks untouched.
    let err = apply_transaction(
        &pool,
        profile,
        &withdraw(vec![line(bandages, 4), line(pistols, 20)]),
    )
    .await
    .expect_err("one short line rejects the request");
    assert_eq!(err.code(), "INSUFFICIENT_STOCK");

    assert_eq!(stock_of(&pool, bandages).await, 6);
    assert_eq!(stock_of(&pool, pistols).await, 10);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM treasury_transactions").await, 0);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM treasury_transaction_items").await,
        0
    );
}

#[sqlx::test]
async fn concurrent_withdrawals_cannot_oversell(pool: PgPool) {
    let profile = seed_profile(&pool).await;
    let item = seed_item(&pool, "Rifle", 10).await;

    // Each request fits the starting stock on its own; together they exceed it.
    // The row lock serializes them, so exactly one commits.
    let first = withdraw(vec![line(item, 7)]);
    let second = withdraw(vec![line(item, 7)]);
    let (a, b) = tokio::join!(
        apply_transaction(&pool, profile, &first),
        apply_transaction(&pool, profile, &second),
    );

    let err = match (a, b) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
        (Ok(_), Ok(_)) => panic!("both withdrawals succeeded against stock 10"),
        (Err(e1), Err(e2)) => panic!("both withdrawals failed: {e1}; {e2}"),
    };
    assert_eq!(err.code(), "INSUFFICIENT_STOCK");

    assert_eq!(stock_of(&pool, item).await, 3);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM treasury_transactions").await, 1);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM treasury_transaction_items").await,
        1
    );
}
