use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    database::Database,
    error::ApiError,
    models::{Transaction, TransactionType},
    response::ApiResponse,
};

/// Manual ledger entry, used by the reports page to record expenses.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransaction {
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    category: String,
    amount: Decimal,
    description: Option<String>,
}

pub async fn create_transaction(
    State(db): State<Database>,
    Json(body): Json<CreateTransaction>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    if body.category.trim().is_empty() {
        return Err(ApiError::validation("Category is required"));
    }
    if body.amount <= Decimal::ZERO {
        return Err(ApiError::validation("Amount must be greater than zero"));
    }

    let transaction = sqlx::query_as::<_, Transaction>(
        "INSERT INTO transactions (type, category, amount, description) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(body.transaction_type)
    .bind(body.category.trim())
    .bind(body.amount)
    .bind(body.description.unwrap_or_default())
    .fetch_one(&db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            transaction,
            "Transaction recorded successfully",
        )),
    ))
}
