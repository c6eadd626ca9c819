use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    ledger::{self, AppliedTransaction, LedgerError, TransactionRequest},
    middleware::get_current_user,
    models::{ActivityEntry, CategoryStock, ItemCategory, TransactionKind, TreasuryItem},
};

const DEFAULT_FEED_LIMIT: i64 = 10;
const MAX_FEED_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct ActivityParams {
    limit: Option<i64>,
}

// Public read views

pub async fn items_list(State(db): State<Database>) -> Result<Json<Vec<TreasuryItem>>, StatusCode> {
    let items = ledger::list_items(&db).await.map_err(|e| {
        log::error!("Failed to list treasury items: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(items))
}

pub async fn activity_feed(
    State(db): State<Database>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<ActivityEntry>>, StatusCode> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);
    let feed = ledger::recent_transactions(&db, limit).await.map_err(|e| {
        log::error!("Failed to load activity feed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(feed))
}

pub async fn distribution(
    State(db): State<Database>,
) -> Result<Json<Vec<CategoryStock>>, StatusCode> {
    let totals = ledger::stock_distribution(&db).await.map_err(|e| {
        log::error!("Failed to load stock distribution: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(totals))
}

// The single write path for stock: admin deposit/withdraw pages and the member
// withdrawal form all post here.

pub async fn create_transaction(
    State(db): State<Database>,
    cookies: Cookies,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<AppliedTransaction>), axum::response::Response> {
    use axum::response::IntoResponse;

    let user = get_current_user(cookies, &db)
        .await
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

    if request.kind == TransactionKind::Deposit && !user.can_manage_treasury() {
        return Err(StatusCode::FORBIDDEN.into_response());
    }

    let transaction = ledger::apply_transaction(&db, user.id, &request)
        .await
        .map_err(LedgerError::into_response)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

// Admin CRUD over items. The form carries no stock field; stock only moves
// through the ledger.

#[derive(Deserialize)]
pub struct TreasuryItemForm {
    name: String,
    category: ItemCategory,
    description: Option<String>,
    #[serde(default)]
    image_urls: Vec<String>,
}

pub async fn create_item(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<TreasuryItemForm>,
) -> Result<(StatusCode, Json<TreasuryItem>), StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.can_manage_treasury() {
        return Err(StatusCode::FORBIDDEN);
    }
    if form.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let item = sqlx::query_as::<_, TreasuryItem>(
        r#"
        INSERT INTO treasury_items (name, category, description, image_urls)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(form.category.as_str())
    .bind(&form.description)
    .bind(&form.image_urls)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create treasury item: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(db): State<Database>,
    cookies: Cookies,
    Path(item_id): Path<Uuid>,
    Json(form): Json<TreasuryItemForm>,
) -> Result<Json<TreasuryItem>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.can_manage_treasury() {
        return Err(StatusCode::FORBIDDEN);
    }
    if form.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let item = sqlx::query_as::<_, TreasuryItem>(
        r#"
        UPDATE treasury_items
        SET name = $1, category = $2, description = $3, image_urls = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(form.category.as_str())
    .bind(&form.description)
    .bind(&form.image_urls)
    .bind(item_id)
    .fetch_optional(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to update treasury item {}: {}", item_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(item))
}

pub async fn delete_item(
    State(db): State<Database>,
    cookies: Cookies,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let result = sqlx::query("DELETE FROM treasury_items WHERE id = $1")
        .bind(item_id)
        .execute(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete treasury item {}: {}", item_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
