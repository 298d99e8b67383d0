use serde::{Deserialize, Serialize};

/// Summary figures for the dashboard landing view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub revenue: f64,
    pub active_staff: u64,
    pub low_stock_products: u64,
}
