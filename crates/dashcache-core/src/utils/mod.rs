//! Utility functions for string formatting.

pub mod format;

pub use format::{format_bytes, format_money, truncate_string};
