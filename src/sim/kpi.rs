//! Post-hoc KPI computation from dispatch records.

use std::fmt;

use super::types::DispatchRecord;

/// Revenue and throughput totals for one battery.
#[derive(Debug, Clone)]
pub struct BatteryKpi {
    pub battery_id: String,
    pub revenue: f64,
    pub charged_mwh: f64,
    pub discharged_mwh: f64,
}

/// Aggregate key performance indicators derived from a complete run.
///
/// Computed post-hoc from `Vec<DispatchRecord>` so the reported metrics stay
/// consistent with the exported rows.
#[derive(Debug, Clone)]
pub struct KpiReport {
    /// Net revenue over the simulation ($; discharge income minus charge cost).
    pub total_revenue: f64,
    /// Total energy absorbed from the grid (MWh, sum of charge magnitudes).
    pub charged_mwh: f64,
    /// Total energy injected into the grid (MWh).
    pub discharged_mwh: f64,
    /// Discharged energy over fleet nameplate capacity.
    pub equivalent_cycles: f64,
    /// Annualized normalized revenue ($/MWh-year).
    pub annualized_rev_per_mwh: f64,
    /// Per-battery breakdown in first-dispatched order.
    pub per_battery: Vec<BatteryKpi>,
}

impl KpiReport {
    /// Computes all KPIs from the complete record vector.
    ///
    /// # Arguments
    ///
    /// * `records` - Complete dispatch records
    /// * `fleet_capacity_mwh` - Fleet nameplate capacity for normalization
    /// * `sim_days` - Simulated horizon in days for annualization
    ///
    /// Zero capacity or a zero-day horizon yields zero cycles and zero
    /// annualized revenue rather than a division error.
    pub fn from_records(records: &[DispatchRecord], fleet_capacity_mwh: f64, sim_days: usize) -> Self {
        let mut total_revenue = 0.0_f64;
        let mut charged_mwh = 0.0_f64;
        let mut discharged_mwh = 0.0_f64;
        let mut per_battery: Vec<BatteryKpi> = Vec::new();

        for r in records {
            total_revenue += r.revenue;
            if r.mw < 0.0 {
                charged_mwh += -r.mw;
            } else {
                discharged_mwh += r.mw;
            }

            let idx = match per_battery.iter().position(|b| b.battery_id == r.battery_id) {
                Some(idx) => idx,
                None => {
                    per_battery.push(BatteryKpi {
                        battery_id: r.battery_id.clone(),
                        revenue: 0.0,
                        charged_mwh: 0.0,
                        discharged_mwh: 0.0,
                    });
                    per_battery.len() - 1
                }
            };
            let entry = &mut per_battery[idx];
            entry.revenue += r.revenue;
            if r.mw < 0.0 {
                entry.charged_mwh += -r.mw;
            } else {
                entry.discharged_mwh += r.mw;
            }
        }

        let equivalent_cycles = if fleet_capacity_mwh > 0.0 {
            discharged_mwh / fleet_capacity_mwh
        } else {
            0.0
        };

        let annualized_rev_per_mwh = if fleet_capacity_mwh > 0.0 && sim_days > 0 {
            (total_revenue / fleet_capacity_mwh) * (365.0 / sim_days as f64)
        } else {
            0.0
        };

        Self {
            total_revenue,
            charged_mwh,
            discharged_mwh,
            equivalent_cycles,
            annualized_rev_per_mwh,
            per_battery,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Summary ---")?;
        writeln!(f, "Total revenue:         {:.2} $", self.total_revenue)?;
        writeln!(f, "Energy charged:        {:.2} MWh", self.charged_mwh)?;
        writeln!(f, "Energy discharged:     {:.2} MWh", self.discharged_mwh)?;
        writeln!(f, "Equivalent cycles:     {:.2}", self.equivalent_cycles)?;
        write!(
            f,
            "Annualized revenue:    {:.2} $/MWh-year",
            self.annualized_rev_per_mwh
        )?;
        for b in &self.per_battery {
            write!(
                f,
                "\n  {}: revenue={:.2} $, charged={:.2} MWh, discharged={:.2} MWh",
                b.battery_id, b.revenue, b.charged_mwh, b.discharged_mwh
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::DispatchAction;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 6)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    fn record(id: &str, hour: u32, mw: f64, price_mwh: f64) -> DispatchRecord {
        DispatchRecord {
            timestamp: ts(hour),
            battery_id: id.to_string(),
            action: DispatchAction::from_mw(mw),
            mw,
            price_mwh,
            revenue: mw * price_mwh,
            soe_before_mwh: 5.0,
            soe_after_mwh: 5.0,
        }
    }

    #[test]
    fn totals_split_by_sign() {
        let records = vec![
            record("a", 0, -4.0, 50.0),
            record("a", 1, 0.0, 120.0),
            record("a", 2, 3.0, 200.0),
            record("b", 2, 1.0, 200.0),
        ];
        let kpi = KpiReport::from_records(&records, 30.0, 1);

        assert!((kpi.charged_mwh - 4.0).abs() < 1e-9);
        assert!((kpi.discharged_mwh - 4.0).abs() < 1e-9);
        // -200 + 0 + 600 + 200
        assert!((kpi.total_revenue - 600.0).abs() < 1e-9);
    }

    #[test]
    fn cycles_use_fleet_capacity() {
        let records = vec![record("a", 0, 10.0, 200.0), record("a", 1, 5.0, 200.0)];
        let kpi = KpiReport::from_records(&records, 30.0, 1);
        assert!((kpi.equivalent_cycles - 0.5).abs() < 1e-9);
    }

    #[test]
    fn annualized_revenue_scales_by_horizon() {
        let records = vec![record("a", 0, 10.0, 100.0)];
        let kpi = KpiReport::from_records(&records, 10.0, 7);
        // (1000 / 10) * (365 / 7)
        assert!((kpi.annualized_rev_per_mwh - 100.0 * 365.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn zero_capacity_is_safe() {
        let records = vec![record("a", 0, 10.0, 100.0)];
        let kpi = KpiReport::from_records(&records, 0.0, 7);
        assert_eq!(kpi.equivalent_cycles, 0.0);
        assert_eq!(kpi.annualized_rev_per_mwh, 0.0);
    }

    #[test]
    fn empty_records_yield_zeroed_report() {
        let kpi = KpiReport::from_records(&[], 30.0, 7);
        assert_eq!(kpi.total_revenue, 0.0);
        assert_eq!(kpi.charged_mwh, 0.0);
        assert_eq!(kpi.discharged_mwh, 0.0);
        assert!(kpi.per_battery.is_empty());
    }

    #[test]
    fn per_battery_breakdown_aggregates_by_id() {
        let records = vec![
            record("a", 0, -4.0, 50.0),
            record("b", 0, -2.0, 50.0),
            record("a", 1, 3.0, 200.0),
        ];
        let kpi = KpiReport::from_records(&records, 30.0, 1);

        assert_eq!(kpi.per_battery.len(), 2);
        assert_eq!(kpi.per_battery[0].battery_id, "a");
        assert!((kpi.per_battery[0].revenue - 400.0).abs() < 1e-9);
        assert!((kpi.per_battery[0].charged_mwh - 4.0).abs() < 1e-9);
        assert!((kpi.per_battery[0].discharged_mwh - 3.0).abs() < 1e-9);
        assert_eq!(kpi.per_battery[1].battery_id, "b");
        assert!((kpi.per_battery[1].revenue + 100.0).abs() < 1e-9);
    }

    #[test]
    fn display_contains_summary_lines() {
        let records = vec![record("a", 0, 10.0, 100.0)];
        let kpi = KpiReport::from_records(&records, 10.0, 7);
        let s = format!("{kpi}");
        assert!(s.contains("Total revenue:"));
        assert!(s.contains("Equivalent cycles:"));
        assert!(s.contains("a: revenue="));
    }
}
