use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an order. Transitions only ever move forward along
/// PENDING → WASHING → DRYING → IRONING → READY → COMPLETED; cancellation is
/// a side exit reachable only through the delete endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Washing,
    Drying,
    Ironing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The single allowed successor, or `None` for terminal states.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Washing),
            OrderStatus::Washing => Some(OrderStatus::Drying),
            OrderStatus::Drying => Some(OrderStatus::Ironing),
            OrderStatus::Ironing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Washing => "WASHING",
            OrderStatus::Drying => "DRYING",
            OrderStatus::Ironing => "IRONING",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "WASHING" => Ok(OrderStatus::Washing),
            "DRYING" => Ok(OrderStatus::Drying),
            "IRONING" => Ok(OrderStatus::Ironing),
            "READY" => Ok(OrderStatus::Ready),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_weight: f64,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub paid_amount: Decimal,
    pub notes: Option<String>,
    pub estimated_completion: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item with a snapshot of the service name and price at checkout time,
/// so later service edits never rewrite order history.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub quantity: i32,
    pub weight: Option<f64>,
    pub price_per_unit: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Subtotal for one cart line: weight-based services charge per unit of
/// weight, everything else per piece. Returns `None` when the weight cannot
/// be represented as a decimal (NaN/infinite).
pub fn line_subtotal(price_per_unit: Decimal, quantity: i32, weight: Option<f64>) -> Option<Decimal> {
    match weight {
        Some(w) => Decimal::try_from(w).ok().map(|w| price_per_unit * w),
        None => Some(price_per_unit * Decimal::from(quantity)),
    }
}

/// Order totals: `total_price` is the sum of line subtotals, `final_price`
/// has the discount applied.
pub fn order_totals(subtotals: &[Decimal], discount_amount: Decimal) -> (Decimal, Decimal) {
    let total_price: Decimal = subtotals.iter().copied().sum();
    (total_price, total_price - discount_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pending_reaches_completed_in_exactly_five_steps() {
        let mut status = OrderStatus::Pending;
        let mut steps = 0;
        while let Some(next) = status.next() {
            status = next;
            steps += 1;
        }
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(steps, 5);
    }

    #[test]
    fn terminal_states_have_no_successor() {
        assert_eq!(OrderStatus::Completed.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("washing".parse::<OrderStatus>(), Ok(OrderStatus::Washing));
        assert_eq!("READY".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert!("folding".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn weight_based_line_charges_per_kilo() {
        // 7000/kg, 5 kg of laundry
        let subtotal = line_subtotal(dec!(7000), 1, Some(5.0)).unwrap();
        assert_eq!(subtotal, dec!(35000));
    }

    #[test]
    fn piece_based_line_charges_per_unit() {
        let subtotal = line_subtotal(dec!(25000), 3, None).unwrap();
        assert_eq!(subtotal, dec!(75000));
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        assert_eq!(line_subtotal(dec!(7000), 1, Some(f64::NAN)), None);
    }

    #[test]
    fn totals_sum_lines_and_apply_discount() {
        let (total, final_price) = order_totals(&[dec!(35000)], Decimal::ZERO);
        assert_eq!(total, dec!(35000));
        assert_eq!(final_price, dec!(35000));

        let (total, final_price) = order_totals(&[dec!(35000), dec!(25000)], dec!(5000));
        assert_eq!(total, dec!(60000));
        assert_eq!(final_price, dec!(55000));
    }
}
