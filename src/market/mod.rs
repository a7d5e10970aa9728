//! Synthetic market price generation.

pub mod price_engine;

// Re-export the main types for convenience
pub use price_engine::PriceEngine;
pub use price_engine::PricePoint;
