//! Plain-text rendering of dashboard resources and cache state.

use std::fmt::Write;

use dashcache_core::cache::EntrySummary;
use dashcache_core::models::{DashboardStats, Order, Product, StaffMember};
use dashcache_core::utils::{format_bytes, format_money, truncate_string};
use dashcache_core::{DataSource, FetchOutcome};

/// Column widths for list views
const NAME_WIDTH: usize = 24;
const EMAIL_WIDTH: usize = 28;
const KEY_WIDTH: usize = 28;

/// One-line description of where the data came from and how old it is.
pub fn freshness_line<T>(outcome: &FetchOutcome<T>) -> String {
    let age = outcome.status.age_display();
    let freshness = match (outcome.source, outcome.status.is_stale) {
        (DataSource::Network, _) => "live".to_string(),
        (_, true) => format!("stale, updated {}", age),
        (_, false) => format!("cached {}", age),
    };
    if outcome.source == DataSource::Offline {
        format!("offline, {}", freshness)
    } else {
        freshness
    }
}

pub fn stats(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Orders:          {}", stats.total_orders);
    let _ = writeln!(out, "Pending:         {}", stats.pending_orders);
    let _ = writeln!(out, "Revenue:         {}", format_money(stats.revenue));
    let _ = writeln!(out, "Active staff:    {}", stats.active_staff);
    let _ = writeln!(out, "Low stock items: {}", stats.low_stock_products);
    out
}

pub fn orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders\n".to_string();
    }
    let mut out = String::new();
    for order in orders {
        let _ = writeln!(
            out,
            "#{:<6} {:<width$} {:<10} {:>3} items {:>14}",
            order.id,
            truncate_string(&order.customer_name, NAME_WIDTH),
            order.status.display_name(),
            order.item_count(),
            format_money(order.total),
            width = NAME_WIDTH,
        );
    }
    out
}

pub fn order(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order #{} - {}", order.id, order.customer_name);
    let _ = writeln!(out, "Status:  {}", order.status.display_name());
    let _ = writeln!(out, "Placed:  {}", order.created_at.format("%Y-%m-%d %H:%M UTC"));
    for item in &order.items {
        let _ = writeln!(
            out,
            "  {:>3} x {:<width$} {:>12}",
            item.quantity,
            truncate_string(&item.product_name, NAME_WIDTH),
            format_money(item.line_total()),
            width = NAME_WIDTH,
        );
    }
    let _ = writeln!(out, "Total:   {}", format_money(order.total));
    out
}

pub fn staff(staff: &[StaffMember]) -> String {
    if staff.is_empty() {
        return "No staff\n".to_string();
    }
    let mut out = String::new();
    for member in staff {
        let _ = writeln!(
            out,
            "{:<width$} {:<email_width$} {:<10}{}",
            truncate_string(&member.full_name(), NAME_WIDTH),
            truncate_string(&member.email, EMAIL_WIDTH),
            member.role.display_name(),
            if member.active { "" } else { " (inactive)" },
            width = NAME_WIDTH,
            email_width = EMAIL_WIDTH,
        );
    }
    out
}

pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products\n".to_string();
    }
    let mut out = String::new();
    for product in products {
        let _ = writeln!(
            out,
            "{:<12} {:<width$} {:>12} {:>5} in stock{}",
            product.sku,
            truncate_string(&product.name, NAME_WIDTH),
            format_money(product.price),
            product.stock,
            if product.is_low_stock() { "  LOW" } else { "" },
            width = NAME_WIDTH,
        );
    }
    out
}

pub fn cache_status(entries: &[EntrySummary], total_bytes: usize) -> String {
    let mut out = String::new();
    for entry in entries {
        let state = match entry.status {
            Some(ref status) if status.is_stale => format!("stale, updated {}", status.age_display()),
            Some(ref status) => format!("fresh, updated {}", status.age_display()),
            None => "unreadable".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<width$} {:<28} {:>10}",
            truncate_string(&entry.key, KEY_WIDTH),
            state,
            format_bytes(entry.size_bytes),
            width = KEY_WIDTH,
        );
    }
    let _ = writeln!(out, "{} entries, {}", entries.len(), format_bytes(total_bytes));
    out
}
