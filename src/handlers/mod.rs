pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod reports;
pub mod services;
pub mod settings;
pub mod transactions;
