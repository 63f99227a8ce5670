use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::Database,
    error::ApiError,
    models::{InventoryHistory, InventoryItem, MovementType},
    response::ApiResponse,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilters {
    category: Option<String>,
    #[serde(default)]
    low_stock: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItem {
    name: String,
    category: Option<String>,
    stock: Option<i32>,
    unit: Option<String>,
    min_stock: Option<i32>,
    price_per_unit: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItem {
    name: Option<String>,
    category: Option<String>,
    stock: Option<i32>,
    unit: Option<String>,
    min_stock: Option<i32>,
    price_per_unit: Option<Decimal>,
    // Optional stock movement recorded alongside the update. The quantity is
    // taken as-is; it is not reconciled against the stock delta.
    #[serde(rename = "type")]
    movement_type: Option<MovementType>,
    quantity: Option<i32>,
    notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    total_items: usize,
    low_stock_items: usize,
    total_value: Decimal,
}

/// List response carries shelf-wide stats next to the (possibly filtered)
/// item list, so the stat cards never change with the filter.
#[derive(Serialize)]
pub struct InventoryListResponse {
    pub success: bool,
    pub data: Vec<InventoryItem>,
    pub stats: InventoryStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemDetail {
    #[serde(flatten)]
    item: InventoryItem,
    stock_history: Vec<InventoryHistory>,
}

pub async fn list_inventory(
    State(db): State<Database>,
    Query(filters): Query<InventoryFilters>,
) -> Result<Json<InventoryListResponse>, ApiError> {
    let category = filters.category.filter(|c| !c.is_empty() && c.as_str() != "all");

    let items = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items \
         WHERE ($1::text IS NULL OR category = $1) \
         ORDER BY name",
    )
    .bind(&category)
    .fetch_all(&db)
    .await?;

    let stats = InventoryStats {
        total_items: items.len(),
        low_stock_items: items.iter().filter(|i| i.is_low_stock()).count(),
        total_value: items.iter().map(|i| i.stock_value()).sum(),
    };

    let data = if filters.low_stock {
        items.into_iter().filter(|i| i.is_low_stock()).collect()
    } else {
        items
    };

    Ok(Json(InventoryListResponse {
        success: true,
        data,
        stats,
    }))
}

pub async fn create_inventory_item(
    State(db): State<Database>,
    Json(body): Json<CreateInventoryItem>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryItem>>), ApiError> {
    let (category, unit) = match (body.category, body.unit) {
        (Some(category), Some(unit))
            if !body.name.trim().is_empty() && !category.is_empty() && !unit.is_empty() =>
        {
            (category, unit)
        }
        _ => return Err(ApiError::validation("Name, category and unit are required")),
    };

    let stock = body.stock.unwrap_or(0);

    let item = sqlx::query_as::<_, InventoryItem>(
        "INSERT INTO inventory_items (name, category, stock, unit, min_stock, price_per_unit) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(body.name.trim())
    .bind(&category)
    .bind(stock)
    .bind(&unit)
    .bind(body.min_stock.unwrap_or(10))
    .bind(body.price_per_unit.unwrap_or(Decimal::ZERO))
    .fetch_one(&db)
    .await?;

    if stock > 0 {
        sqlx::query(
            "INSERT INTO inventory_history (inventory_item_id, movement_type, quantity, notes) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(item.id)
        .bind(MovementType::In)
        .bind(stock)
        .bind("Initial stock")
        .execute(&db)
        .await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(item, "Inventory item added successfully")),
    ))
}

pub async fn get_inventory_item(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryItemDetail>>, ApiError> {
    let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
        .bind(id)
        .fetch_optional(&db)
        .await?
        .ok_or(ApiError::NotFound("Inventory item"))?;

    let stock_history = sqlx::query_as::<_, InventoryHistory>(
        "SELECT * FROM inventory_history \
         WHERE inventory_item_id = $1 \
         ORDER BY created_at DESC \
         LIMIT 10",
    )
    .bind(id)
    .fetch_all(&db)
    .await?;

    Ok(Json(ApiResponse::ok(InventoryItemDetail {
        item,
        stock_history,
    })))
}

pub async fn update_inventory_item(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateInventoryItem>,
) -> Result<Json<ApiResponse<InventoryItem>>, ApiError> {
    let item = sqlx::query_as::<_, InventoryItem>(
        "UPDATE inventory_items SET \
            name = COALESCE($2, name), \
            category = COALESCE($3, category), \
            stock = COALESCE($4, stock), \
            unit = COALESCE($5, unit), \
            min_stock = COALESCE($6, min_stock), \
            price_per_unit = COALESCE($7, price_per_unit), \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&body.name)
    .bind(&body.category)
    .bind(body.stock)
    .bind(&body.unit)
    .bind(body.min_stock)
    .bind(body.price_per_unit)
    .fetch_optional(&db)
    .await?
    .ok_or(ApiError::NotFound("Inventory item"))?;

    if let (Some(movement_type), Some(quantity)) = (body.movement_type, body.quantity) {
        sqlx::query(
            "INSERT INTO inventory_history (inventory_item_id, movement_type, quantity, notes) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(movement_type)
        .bind(quantity)
        .bind(&body.notes)
        .execute(&db)
        .await?;
    }

    Ok(Json(ApiResponse::with_message(
        item,
        "Inventory item updated successfully",
    )))
}

pub async fn delete_inventory_item(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Inventory item"));
    }

    Ok(Json(ApiResponse::message("Inventory item deleted successfully")))
}
