//! Fleet aggregation over an ordered collection of batteries.

use std::collections::HashSet;
use std::fmt;

use super::battery::Battery;

/// Errors raised by fleet construction and per-unit dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    /// Two batteries share the same id; lookup by id would be ambiguous.
    DuplicateId(String),
    /// Dispatch was requested for an id no battery carries.
    UnknownBattery(String),
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate battery id \"{id}\" in fleet"),
            Self::UnknownBattery(id) => write!(f, "battery \"{id}\" not found in fleet"),
        }
    }
}

impl std::error::Error for FleetError {}

/// Snapshot of one battery's state for reporting.
#[derive(Debug, Clone)]
pub struct BatteryStatus {
    pub id: String,
    pub soe_mwh: f64,
    pub soe_pct: f64,
}

/// An insertion-ordered collection of batteries with derived aggregates.
///
/// Ids are unique; [`Fleet::new`] rejects duplicates so that dispatch by id
/// always resolves to exactly one unit.
#[derive(Debug, Clone)]
pub struct Fleet {
    batteries: Vec<Battery>,
}

impl Fleet {
    /// Creates a fleet from an ordered list of batteries.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::DuplicateId`] if two batteries share an id.
    pub fn new(batteries: Vec<Battery>) -> Result<Self, FleetError> {
        let mut seen = HashSet::new();
        for battery in &batteries {
            if !seen.insert(battery.id.as_str()) {
                return Err(FleetError::DuplicateId(battery.id.clone()));
            }
        }
        Ok(Self { batteries })
    }

    /// Number of batteries in the fleet.
    pub fn count(&self) -> usize {
        self.batteries.len()
    }

    /// Sum of battery capacities in MWh.
    pub fn total_capacity_mwh(&self) -> f64 {
        self.batteries.iter().map(|b| b.capacity_mwh).sum()
    }

    /// Sum of current battery SoE in MWh.
    pub fn current_soe_mwh(&self) -> f64 {
        self.batteries.iter().map(|b| b.soe_mwh()).sum()
    }

    /// Aggregate maximum charging power in MW.
    pub fn agg_charge_rate_mw(&self) -> f64 {
        self.batteries.iter().map(|b| b.max_charge_mw).sum()
    }

    /// Aggregate maximum discharging power in MW.
    pub fn agg_discharge_rate_mw(&self) -> f64 {
        self.batteries.iter().map(|b| b.max_discharge_mw).sum()
    }

    /// Batteries in insertion order.
    pub fn batteries(&self) -> &[Battery] {
        &self.batteries
    }

    /// Mutable access to the batteries in insertion order.
    ///
    /// The SoE itself stays private to [`Battery`]; this only exposes the
    /// dispatch surface ([`Battery::update_soe`]) for callers that walk the
    /// fleet in a custom order.
    pub fn batteries_mut(&mut self) -> &mut [Battery] {
        &mut self.batteries
    }

    /// Dispatches a specific battery by id and returns the realized MW.
    ///
    /// The scan is linear; fleets are small.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::UnknownBattery`] if no battery matches the id.
    pub fn dispatch(&mut self, battery_id: &str, mw: f64, dt_hours: f64) -> Result<f64, FleetError> {
        for battery in &mut self.batteries {
            if battery.id == battery_id {
                return Ok(battery.update_soe(mw, dt_hours));
            }
        }
        Err(FleetError::UnknownBattery(battery_id.to_string()))
    }

    /// State snapshot of every battery, in insertion order.
    pub fn status(&self) -> Vec<BatteryStatus> {
        self.batteries
            .iter()
            .map(|b| BatteryStatus {
                id: b.id.clone(),
                soe_mwh: b.soe_mwh(),
                soe_pct: b.soe_pct(),
            })
            .collect()
    }
}
