use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{database::Database, middleware::get_current_user};

#[derive(Serialize)]
pub struct DashboardResponse {
    pub treasury_items: i64,
    pub total_stock: i64,
    pub transactions: i64,
    pub crafting_items: i64,
    pub materials: i64,
    pub map_locations: i64,
    pub roster_members: i64,
    pub stories: i64,
    pub gallery_albums: i64,
}

async fn count(db: &Database, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(db)
        .await
        .unwrap_or(0)
}

pub async fn dashboard(
    State(db): State<Database>,
    cookies: Cookies,
) -> Result<Json<DashboardResponse>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let response = DashboardResponse {
        treasury_items: count(&db, "SELECT COUNT(*) FROM treasury_items").await,
        total_stock: count(&db, "SELECT COALESCE(SUM(stock), 0) FROM treasury_items").await,
        transactions: count(&db, "SELECT COUNT(*) FROM treasury_transactions").await,
        crafting_items: count(&db, "SELECT COUNT(*) FROM crafting_items").await,
        materials: count(&db, "SELECT COUNT(*) FROM materials").await,
        map_locations: count(&db, "SELECT COUNT(*) FROM map_locations").await,
        roster_members: count(&db, "SELECT COUNT(*) FROM roster_members").await,
        stories: count(&db, "SELECT COUNT(*) FROM stories").await,
        gallery_albums: count(&db, "SELECT COUNT(*) FROM gallery_albums").await,
    };

    Ok(Json(response))
}
