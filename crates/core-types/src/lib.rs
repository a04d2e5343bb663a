//! Shared value types for the Value Lab workspace.
//!
//! Every other crate speaks in terms of these dated observations: the quote
//! client produces them, the analytics engine consumes them and the web layer
//! serializes them.

pub mod series;

// Re-export the core types to provide a clean public API.
pub use series::{MonthlyObservation, PricePoint, ReturnPoint};
