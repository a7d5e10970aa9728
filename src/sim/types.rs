//! Core dispatch record types shared by the optimizer, KPI, and export layers.

use std::fmt;

use chrono::NaiveDateTime;

/// Dispatch action label derived from the sign of the realized power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    Charge,
    Discharge,
    Idle,
}

impl DispatchAction {
    /// Classifies a realized grid-side power value.
    pub fn from_mw(mw: f64) -> Self {
        if mw < 0.0 {
            Self::Charge
        } else if mw > 0.0 {
            Self::Discharge
        } else {
            Self::Idle
        }
    }

    /// Uppercase label used in exports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Charge => "CHARGE",
            Self::Discharge => "DISCHARGE",
            Self::Idle => "IDLE",
        }
    }
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete record of one battery's dispatch at one timestep.
///
/// Power follows the grid-side convention: negative MW is charging,
/// positive MW is discharging. Records are emitted for every
/// (timestep, battery) pair, idle steps included, grouped by timestamp and
/// ordered by dispatch priority within a timestep.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    /// Market interval start time.
    pub timestamp: NaiveDateTime,
    /// Id of the dispatched battery.
    pub battery_id: String,
    /// Action label matching the sign of `mw`.
    pub action: DispatchAction,
    /// Realized grid-side power (MW, signed).
    pub mw: f64,
    /// Market price for the interval ($/MWh).
    pub price_mwh: f64,
    /// Signed cash value of the dispatch ($).
    pub revenue: f64,
    /// State of energy before the dispatch (MWh).
    pub soe_before_mwh: f64,
    /// State of energy after the dispatch (MWh).
    pub soe_after_mwh: f64,
}

impl fmt::Display for DispatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:<12} {:>9} {:>8.3} MW @ {:>6.2} $/MWh  rev={:>9.2} $  SoE {:.2} -> {:.2} MWh",
            self.timestamp,
            self.battery_id,
            self.action,
            self.mw,
            self.price_mwh,
            self.revenue,
            self.soe_before_mwh,
            self.soe_after_mwh,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn action_from_mw_sign() {
        assert_eq!(DispatchAction::from_mw(-3.2), DispatchAction::Charge);
        assert_eq!(DispatchAction::from_mw(4.0), DispatchAction::Discharge);
        assert_eq!(DispatchAction::from_mw(0.0), DispatchAction::Idle);
    }

    #[test]
    fn action_labels() {
        assert_eq!(DispatchAction::Charge.as_str(), "CHARGE");
        assert_eq!(DispatchAction::Discharge.as_str(), "DISCHARGE");
        assert_eq!(DispatchAction::Idle.as_str(), "IDLE");
    }

    #[test]
    fn record_display_does_not_panic() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 6)
            .and_then(|d| d.and_hms_opt(17, 0, 0))
            .expect("valid timestamp");
        let r = DispatchRecord {
            timestamp: ts,
            battery_id: "alpha".to_string(),
            action: DispatchAction::Discharge,
            mw: 5.0,
            price_mwh: 180.25,
            revenue: 901.25,
            soe_before_mwh: 9.5,
            soe_after_mwh: 3.94,
        };
        let s = format!("{r}");
        assert!(s.contains("DISCHARGE"));
        assert!(s.contains("alpha"));
    }
}
