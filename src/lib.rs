//! Despensa Library
//!
//! Recipe quantity normalization and shopping list aggregation.

pub mod build_info;
pub mod config;
pub mod mcp;
pub mod models;
pub mod quantity;
pub mod shopping;
pub mod tools;
