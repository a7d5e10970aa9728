//! Battery energy storage components.

/// Single-unit battery physics and constraint model.
pub mod battery;
/// Ordered battery collection with derived aggregates.
pub mod fleet;

// Re-export the main types for convenience
pub use battery::Battery;
pub use fleet::BatteryStatus;
pub use fleet::Fleet;
pub use fleet::FleetError;
