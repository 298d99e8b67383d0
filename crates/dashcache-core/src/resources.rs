//! Cache keys and freshness windows for each dashboard resource.

use std::time::Duration;

/// Dashboard statistics go stale after 5 minutes.
pub const DASHBOARD_STATS_TTL: Duration = Duration::from_secs(5 * 60);

/// Order lists and single orders change often; 5 minutes.
pub const ORDERS_TTL: Duration = Duration::from_secs(5 * 60);

/// Staff changes rarely; 10 minutes.
pub const STAFF_TTL: Duration = Duration::from_secs(10 * 60);

/// Catalog edits are infrequent; 10 minutes.
pub const PRODUCTS_TTL: Duration = Duration::from_secs(10 * 60);

/// Prefix shared by every single-order entry (`order_<id>`).
pub const ORDER_DETAIL_PREFIX: &str = "order_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    DashboardStats,
    OrdersList,
    OrderDetail(i64),
    StaffList,
    ProductsList,
}

impl Resource {
    pub fn cache_key(&self) -> String {
        match self {
            Resource::DashboardStats => "dashboard_stats".to_string(),
            Resource::OrdersList => "orders_list".to_string(),
            Resource::OrderDetail(id) => format!("{}{}", ORDER_DETAIL_PREFIX, id),
            Resource::StaffList => "staff_list".to_string(),
            Resource::ProductsList => "products_list".to_string(),
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Resource::DashboardStats => DASHBOARD_STATS_TTL,
            Resource::OrdersList | Resource::OrderDetail(_) => ORDERS_TTL,
            Resource::StaffList => STAFF_TTL,
            Resource::ProductsList => PRODUCTS_TTL,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Resource::DashboardStats => "Dashboard".to_string(),
            Resource::OrdersList => "Orders".to_string(),
            Resource::OrderDetail(id) => format!("Order #{}", id),
            Resource::StaffList => "Staff".to_string(),
            Resource::ProductsList => "Products".to_string(),
        }
    }
}
