use serde::{Deserialize, Serialize};

/// Stock at or below this level is flagged on the dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub stock: u32,
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= LOW_STOCK_THRESHOLD
    }
}
