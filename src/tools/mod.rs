//! Despensa Tools module
//!
//! MCP tool implementations.

pub mod quantities;
pub mod shopping_lists;
pub mod status;
