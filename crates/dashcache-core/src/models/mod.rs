//! Data models for dashboard entities.
//!
//! These are the typed payloads returned by the dashboard API and stored
//! in the cache:
//!
//! - `Order`, `OrderItem`, `OrderStatus`: customer orders
//! - `StaffMember`, `StaffRole`: back-office staff
//! - `Product`: catalog entries with stock levels
//! - `DashboardStats`: the summary numbers on the landing view

pub mod order;
pub mod product;
pub mod staff;
pub mod stats;

pub use order::{Order, OrderItem, OrderStatus};
pub use product::Product;
pub use staff::{StaffMember, StaffRole};
pub use stats::DashboardStats;
