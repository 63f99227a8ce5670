use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{database::Database, error::ApiError, models::Settings, response::ApiResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    business_name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    receipt_footer: Option<String>,
}

async fn fetch_or_create(db: &Database) -> Result<Settings, ApiError> {
    if let Some(settings) = sqlx::query_as::<_, Settings>("SELECT * FROM settings LIMIT 1")
        .fetch_optional(db)
        .await?
    {
        return Ok(settings);
    }

    let settings = sqlx::query_as::<_, Settings>(
        "INSERT INTO settings (business_name, address, phone, email, receipt_footer) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind("LaundryPro")
    .bind("123 Example Street")
    .bind("08123456789")
    .bind("info@laundrypro.example")
    .bind("Thank you for your trust!")
    .fetch_one(db)
    .await?;

    Ok(settings)
}

pub async fn get_settings(
    State(db): State<Database>,
) -> Result<Json<ApiResponse<Settings>>, ApiError> {
    let settings = fetch_or_create(&db).await?;
    Ok(Json(ApiResponse::ok(settings)))
}

pub async fn update_settings(
    State(db): State<Database>,
    Json(body): Json<UpdateSettings>,
) -> Result<Json<ApiResponse<Settings>>, ApiError> {
    let current = fetch_or_create(&db).await?;

    let settings = sqlx::query_as::<_, Settings>(
        "UPDATE settings SET \
            business_name = COALESCE($2, business_name), \
            address = COALESCE($3, address), \
            phone = COALESCE($4, phone), \
            email = COALESCE($5, email), \
            receipt_footer = COALESCE($6, receipt_footer), \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(current.id)
    .bind(&body.business_name)
    .bind(&body.address)
    .bind(&body.phone)
    .bind(&body.email)
    .bind(&body.receipt_footer)
    .fetch_one(&db)
    .await?;

    Ok(Json(ApiResponse::with_message(
        settings,
        "Settings saved successfully",
    )))
}
