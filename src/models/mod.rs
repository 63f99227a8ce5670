pub mod customer;
pub mod inventory;
pub mod order;
pub mod service;
pub mod settings;
pub mod transaction;

// Re-export only the types we actually use
pub use customer::Customer;
pub use inventory::{InventoryHistory, InventoryItem, MovementType};
pub use order::{Order, OrderItem, OrderStatus, Payment, PaymentStatus};
pub use service::Service;
pub use settings::Settings;
pub use transaction::{Transaction, TransactionType};
