use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    calculator::{self, MaterialRequirement},
    database::Database,
    middleware::get_current_user,
    models::{AcquisitionData, CraftingItem, IngredientDetail, Material},
};

#[derive(Serialize)]
pub struct BlueprintDetail {
    #[serde(flatten)]
    pub item: CraftingItem,
    pub ingredients: Vec<IngredientDetail>,
}

#[derive(Serialize)]
pub struct RequirementsResponse {
    pub item_id: Uuid,
    pub item_name: String,
    pub target_quantity: i64,
    pub requirements: Vec<MaterialRequirement>,
}

async fn fetch_ingredients(
    db: &Database,
    recipe_id: Uuid,
) -> Result<Vec<IngredientDetail>, sqlx::Error> {
    sqlx::query_as::<_, IngredientDetail>(
        r#"
        SELECT ri.material_id, m.name AS material_name, ri.quantity,
               m.tutorial, m.image_url, m.location_image_url, m.acquisition_data
        FROM recipe_ingredients ri
        JOIN materials m ON m.id = ri.material_id
        WHERE ri.recipe_id = $1
        ORDER BY m.name
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

// Public knowledge base

pub async fn items_list(State(db): State<Database>) -> Result<Json<Vec<CraftingItem>>, StatusCode> {
    let items = sqlx::query_as::<_, CraftingItem>("SELECT * FROM crafting_items ORDER BY name")
        .fetch_all(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to list crafting items: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(items))
}

pub async fn item_detail(
    State(db): State<Database>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<BlueprintDetail>, StatusCode> {
    let item = sqlx::query_as::<_, CraftingItem>("SELECT * FROM crafting_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let ingredients = fetch_ingredients(&db, item_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(BlueprintDetail { item, ingredients }))
}

#[derive(Deserialize)]
pub struct RequirementsParams {
    quantity: Option<i64>,
}

pub async fn item_requirements(
    State(db): State<Database>,
    Path(item_id): Path<Uuid>,
    Query(params): Query<RequirementsParams>,
) -> Result<Json<RequirementsResponse>, StatusCode> {
    let target_quantity = params.quantity.unwrap_or(1);
    if target_quantity < 1 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let item = sqlx::query_as::<_, CraftingItem>("SELECT * FROM crafting_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let ingredients = fetch_ingredients(&db, item_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let requirements = ingredients
        .iter()
        .map(|ing| {
            // Acquisition data is validated at write time; anything unreadable is
            // treated as method-less.
            let acquisition = ing
                .acquisition_data
                .clone()
                .and_then(|v| serde_json::from_value::<AcquisitionData>(v).ok());
            calculator::material_requirement(
                ing.material_id,
                &ing.material_name,
                i64::from(ing.quantity),
                acquisition.as_ref(),
                target_quantity,
            )
        })
        .collect();

    Ok(Json(RequirementsResponse {
        item_id: item.id,
        item_name: item.name,
        target_quantity,
        requirements,
    }))
}

pub async fn materials_list(State(db): State<Database>) -> Result<Json<Vec<Material>>, StatusCode> {
    let materials = sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY name")
        .fetch_all(&db)
        .await
        .map_err(|e| {
            log::error!("Failed to list materials: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(materials))
}

// Admin CRUD

#[derive(Deserialize)]
pub struct IngredientForm {
    material_id: Uuid,
    quantity: i32,
}

#[derive(Deserialize)]
pub struct BlueprintForm {
    name: String,
    category: String,
    description: Option<String>,
    base_price: Option<Decimal>,
    image_url: Option<String>,
    #[serde(default)]
    ingredients: Vec<IngredientForm>,
}

fn validate_blueprint(form: &BlueprintForm) -> Result<(), StatusCode> {
    if form.name.trim().is_empty() || form.category.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    if form.ingredients.iter().any(|i| i.quantity < 1) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    Ok(())
}

pub async fn create_blueprint(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<BlueprintForm>,
) -> Result<(StatusCode, Json<CraftingItem>), StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    validate_blueprint(&form)?;

    let mut txn = db.begin().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let item = sqlx::query_as::<_, CraftingItem>(
        r#"
        INSERT INTO crafting_items (name, category, description, base_price, image_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(form.category.trim())
    .bind(&form.description)
    .bind(form.base_price)
    .bind(&form.image_url)
    .fetch_one(&mut *txn)
    .await
    .map_err(|e| {
        log::error!("Failed to create crafting item: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    for ingredient in &form.ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, material_id, quantity) VALUES ($1, $2, $3)",
        )
        .bind(item.id)
        .bind(ingredient.material_id)
        .bind(ingredient.quantity)
        .execute(&mut *txn)
        .await
        .map_err(|e| {
            log::error!("Failed to insert ingredient: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    }

    txn.commit().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_blueprint(
    State(db): State<Database>,
    cookies: Cookies,
    Path(item_id): Path<Uuid>,
    Json(form): Json<BlueprintForm>,
) -> Result<Json<CraftingItem>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    validate_blueprint(&form)?;

    let mut txn = db.begin().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let item = sqlx::query_as::<_, CraftingItem>(
        r#"
        UPDATE crafting_items
        SET name = $1, category = $2, description = $3, base_price = $4, image_url = $5
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(form.category.trim())
    .bind(&form.description)
    .bind(form.base_price)
    .bind(&form.image_url)
    .bind(item_id)
    .fetch_optional(&mut *txn)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    // Ingredient set is replaced wholesale, inside the same transaction.
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(item_id)
        .execute(&mut *txn)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    for ingredient in &form.ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, material_id, quantity) VALUES ($1, $2, $3)",
        )
        .bind(item_id)
        .bind(ingredient.material_id)
        .bind(ingredient.quantity)
        .execute(&mut *txn)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    }

    txn.commit().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(item))
}

pub async fn delete_blueprint(
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

    let result = sqlx::query("DELETE FROM crafting_items WHERE id = $1")
        .bind(item_id)
        .execute(&db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct MaterialForm {
    name: String,
    tutorial: Option<String>,
    image_url: Option<String>,
    location_image_url: Option<String>,
    acquisition_data: Option<AcquisitionData>,
}

fn acquisition_json(
    acquisition: &Option<AcquisitionData>,
) -> Result<Option<serde_json::Value>, StatusCode> {
    match acquisition {
        Some(data) => {
            data.validate().map_err(|reason| {
                log::warn!("Rejected acquisition data: {}", reason);
                StatusCode::UNPROCESSABLE_ENTITY
            })?;
            let value =
                serde_json::to_value(data).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn create_material(
    State(db): State<Database>,
    cookies: Cookies,
    Json(form): Json<MaterialForm>,
) -> Result<(StatusCode, Json<Material>), StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    if form.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let acquisition = acquisition_json(&form.acquisition_data)?;

    let material = sqlx::query_as::<_, Material>(
        r#"
        INSERT INTO materials (name, tutorial, image_url, location_image_url, acquisition_data)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(&form.tutorial)
    .bind(&form.image_url)
    .bind(&form.location_image_url)
    .bind(acquisition)
    .fetch_one(&db)
    .await
    .map_err(|e| {
        log::error!("Failed to create material: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn update_material(
    State(db): State<Database>,
    cookies: Cookies,
    Path(material_id): Path<Uuid>,
    Json(form): Json<MaterialForm>,
) -> Result<Json<Material>, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    if form.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let acquisition = acquisition_json(&form.acquisition_data)?;

    let material = sqlx::query_as::<_, Material>(
        r#"
        UPDATE materials
        SET name = $1, tutorial = $2, image_url = $3, location_image_url = $4, acquisition_data = $5
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(form.name.trim())
    .bind(&form.tutorial)
    .bind(&form.image_url)
    .bind(&form.location_image_url)
    .bind(acquisition)
    .bind(material_id)
    .fetch_optional(&db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(material))
}

pub async fn delete_material(
    State(db): State<Database>,
    cookies: Cookies,
    Path(material_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let user = get_current_user(cookies, &db)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let result = sqlx::query("DELETE FROM materials WHERE id = $1")
        .bind(material_id)
        .execute(&db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
