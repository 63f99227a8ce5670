use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub stock: i32,
    pub unit: String,
    pub min_stock: i32,
    pub price_per_unit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Low stock means the current stock has fallen to or below the
    /// configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Book value of what is currently on the shelf.
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.stock) * self.price_per_unit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

/// Append-only record of a stock movement. The quantity is not reconciled
/// against the item's stock delta; the caller keeps them consistent.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryHistory {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(stock: i32, min_stock: i32) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: "Detergent".to_string(),
            category: "detergent".to_string(),
            stock,
            unit: "kg".to_string(),
            min_stock,
            price_per_unit: dec!(15000),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_holds_at_and_below_the_threshold() {
        assert!(item(5, 10).is_low_stock());
        assert!(item(10, 10).is_low_stock());
        assert!(!item(11, 10).is_low_stock());
    }

    #[test]
    fn stock_value_multiplies_stock_by_unit_price() {
        assert_eq!(item(4, 10).stock_value(), dec!(60000));
        assert_eq!(item(0, 10).stock_value(), dec!(0));
    }
}
