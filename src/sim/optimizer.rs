//! Threshold dispatch optimizer: per-timestep priority sort and greedy
//! allocation of fleet power headroom.

use crate::bess::Fleet;
use crate::market::PricePoint;

use super::revenue::revenue;
use super::types::{DispatchAction, DispatchRecord};

/// Parameters of the threshold charge/discharge strategy.
///
/// Scenario validation guarantees `charge_threshold <= discharge_threshold`
/// and finite, non-negative fleet rates before an optimizer is built.
#[derive(Debug, Clone)]
pub struct StrategyParams {
    /// Charge when the price is strictly below this ($/MWh).
    pub charge_threshold: f64,
    /// Discharge when the price is strictly above this ($/MWh).
    pub discharge_threshold: f64,
    /// Fleet-level charging power budget (MW, positive magnitude).
    pub fleet_max_charge_mw: f64,
    /// Fleet-level discharging power budget (MW, positive magnitude).
    pub fleet_max_discharge_mw: f64,
    /// Duration of one market interval in hours.
    pub dt_hours: f64,
}

/// Greedy per-timestep dispatch optimizer.
///
/// Holds only strategy parameters; all mutable state lives in the [`Fleet`]
/// borrowed by [`Optimizer::run`], so alternate strategies can be explored
/// against cloned fleets.
#[derive(Debug, Clone)]
pub struct Optimizer {
    params: StrategyParams,
}

impl Optimizer {
    /// Creates an optimizer for the given strategy parameters.
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    /// Runs the threshold strategy over an ordered price series.
    ///
    /// Produces one record per (timestep, battery) pair, idle intervals
    /// included, in timestamp order with dispatch-priority order inside each
    /// timestep.
    pub fn run(&self, fleet: &mut Fleet, prices: &[PricePoint]) -> Vec<DispatchRecord> {
        let mut records = Vec::with_capacity(prices.len() * fleet.count());
        for point in prices {
            records.extend(self.step(fleet, point));
        }
        records
    }

    /// Executes one market interval and returns its records.
    ///
    /// The per-step transition is a pure function of the fleet state and the
    /// price point; the running fleet total starts at zero every call and is
    /// never carried across intervals.
    pub fn step(&self, fleet: &mut Fleet, point: &PricePoint) -> Vec<DispatchRecord> {
        let is_charge = point.price_mwh < self.params.charge_threshold;
        let is_discharge = point.price_mwh > self.params.discharge_threshold;

        let order = prioritize(fleet, is_charge, is_discharge);

        let mut records = Vec::with_capacity(order.len());
        let mut fleet_mw = 0.0;

        for idx in order {
            let battery = &mut fleet.batteries_mut()[idx];

            let desired_mw = if is_charge {
                -battery.max_charge_mw
            } else if is_discharge {
                battery.max_discharge_mw
            } else {
                0.0
            };

            let action_mw = clamp_to_fleet_headroom(
                desired_mw,
                fleet_mw,
                self.params.fleet_max_charge_mw,
                self.params.fleet_max_discharge_mw,
            );

            let soe_before_mwh = battery.soe_mwh();
            let realized_mw = battery.update_soe(action_mw, self.params.dt_hours);
            let soe_after_mwh = battery.soe_mwh();
            fleet_mw += realized_mw;

            records.push(DispatchRecord {
                timestamp: point.timestamp,
                battery_id: battery.id.clone(),
                action: DispatchAction::from_mw(realized_mw),
                mw: realized_mw,
                price_mwh: point.price_mwh,
                revenue: revenue(realized_mw, point.price_mwh, self.params.dt_hours),
                soe_before_mwh,
                soe_after_mwh,
            });
        }

        records
    }
}

/// Battery indices in dispatch-priority order for one timestep.
///
/// Charging favors units that can absorb the most power, have the most room,
/// and are least full; discharging mirrors this with the fullest units first.
/// The sort is stable, so remaining ties fall back to fleet insertion order.
/// Idle intervals keep the insertion order unchanged.
fn prioritize(fleet: &Fleet, is_charge: bool, is_discharge: bool) -> Vec<usize> {
    let batteries = fleet.batteries();
    let mut order: Vec<usize> = (0..batteries.len()).collect();

    if is_charge {
        order.sort_by(|&a, &b| {
            let (x, y) = (&batteries[a], &batteries[b]);
            y.max_charge_mw
                .total_cmp(&x.max_charge_mw)
                .then(y.capacity_mwh.total_cmp(&x.capacity_mwh))
                .then(x.soe_mwh().total_cmp(&y.soe_mwh()))
        });
    } else if is_discharge {
        order.sort_by(|&a, &b| {
            let (x, y) = (&batteries[a], &batteries[b]);
            y.max_discharge_mw
                .total_cmp(&x.max_discharge_mw)
                .then(y.capacity_mwh.total_cmp(&x.capacity_mwh))
                .then(y.soe_mwh().total_cmp(&x.soe_mwh()))
        });
    }

    order
}

/// Clamps a desired battery power against the remaining fleet headroom.
///
/// `fleet_mw` is the signed running total already dispatched this timestep.
/// Exhausted headroom (remaining <= 0) yields exactly 0, never a partial or
/// sign-flipped value.
fn clamp_to_fleet_headroom(
    desired_mw: f64,
    fleet_mw: f64,
    fleet_max_charge_mw: f64,
    fleet_max_discharge_mw: f64,
) -> f64 {
    if desired_mw < 0.0 {
        let remaining = fleet_max_charge_mw - fleet_mw.abs();
        if remaining > 0.0 { desired_mw.max(-remaining) } else { 0.0 }
    } else if desired_mw > 0.0 {
        let remaining = fleet_max_discharge_mw - fleet_mw.abs();
        if remaining > 0.0 { desired_mw.min(remaining) } else { 0.0 }
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bess::Battery;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 6)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    fn point(hour: u32, price_mwh: f64) -> PricePoint {
        PricePoint {
            timestamp: ts(hour),
            price_mwh,
        }
    }

    fn battery(id: &str, capacity_mwh: f64, rate_mw: f64, efficiency: f64, soe_mwh: f64) -> Battery {
        Battery::new(id.to_string(), capacity_mwh, rate_mw, rate_mw, efficiency, soe_mwh)
    }

    fn optimizer(charge: f64, discharge: f64, fleet_mw: f64) -> Optimizer {
        Optimizer::new(StrategyParams {
            charge_threshold: charge,
            discharge_threshold: discharge,
            fleet_max_charge_mw: fleet_mw,
            fleet_max_discharge_mw: fleet_mw,
            dt_hours: 1.0,
        })
    }

    #[test]
    fn idle_between_thresholds_dispatches_nothing() {
        let mut fleet = Fleet::new(vec![
            battery("alpha", 20.0, 10.0, 0.9, 10.0),
            battery("bravo", 10.0, 5.0, 0.9, 5.0),
        ])
        .expect("unique ids");

        let records = optimizer(100.0, 150.0, 100.0).step(&mut fleet, &point(12, 120.0));

        assert_eq!(records.len(), 2);
        for r in &records {
            assert_eq!(r.action, DispatchAction::Idle);
            assert_eq!(r.mw, 0.0);
            assert_eq!(r.revenue, 0.0);
            assert_eq!(r.soe_before_mwh, r.soe_after_mwh);
        }
        // Idle iteration keeps fleet insertion order.
        assert_eq!(records[0].battery_id, "alpha");
        assert_eq!(records[1].battery_id, "bravo");
    }

    #[test]
    fn price_equal_to_threshold_is_idle() {
        let mut fleet =
            Fleet::new(vec![battery("alpha", 20.0, 10.0, 0.9, 10.0)]).expect("unique ids");
        let opt = optimizer(100.0, 150.0, 100.0);

        for price in [100.0, 150.0] {
            let records = opt.step(&mut fleet, &point(12, price));
            assert_eq!(records[0].action, DispatchAction::Idle);
        }
    }

    #[test]
    fn charges_below_threshold_at_full_rate() {
        let mut fleet =
            Fleet::new(vec![battery("alpha", 20.0, 10.0, 1.0, 0.0)]).expect("unique ids");
        let records = optimizer(100.0, 150.0, 100.0).step(&mut fleet, &point(3, 60.0));

        assert_eq!(records[0].action, DispatchAction::Charge);
        assert_eq!(records[0].mw, -10.0);
        assert_eq!(records[0].revenue, -600.0);
        assert_eq!(records[0].soe_before_mwh, 0.0);
        assert_eq!(records[0].soe_after_mwh, 10.0);
    }

    #[test]
    fn discharges_above_threshold_at_full_rate() {
        let mut fleet =
            Fleet::new(vec![battery("alpha", 20.0, 10.0, 1.0, 20.0)]).expect("unique ids");
        let records = optimizer(100.0, 150.0, 100.0).step(&mut fleet, &point(18, 200.0));

        assert_eq!(records[0].action, DispatchAction::Discharge);
        assert_eq!(records[0].mw, 10.0);
        assert_eq!(records[0].revenue, 2000.0);
    }

    #[test]
    fn fleet_headroom_binds_before_second_battery() {
        // A (10 MW) outranks B (5 MW); an 8 MW fleet budget is consumed
        // entirely by A, leaving B idle.
        let mut fleet = Fleet::new(vec![
            battery("a", 20.0, 10.0, 1.0, 0.0),
            battery("b", 10.0, 5.0, 1.0, 0.0),
        ])
        .expect("unique ids");

        let records = optimizer(100.0, 150.0, 8.0).step(&mut fleet, &point(3, 50.0));

        assert_eq!(records[0].battery_id, "a");
        assert_eq!(records[0].mw, -8.0);
        assert_eq!(records[1].battery_id, "b");
        assert_eq!(records[1].mw, 0.0);
        assert_eq!(records[1].action, DispatchAction::Idle);
    }

    #[test]
    fn partial_headroom_is_split_across_batteries() {
        let mut fleet = Fleet::new(vec![
            battery("a", 20.0, 10.0, 1.0, 0.0),
            battery("b", 10.0, 5.0, 1.0, 0.0),
        ])
        .expect("unique ids");

        let records = optimizer(100.0, 150.0, 12.0).step(&mut fleet, &point(3, 50.0));

        assert_eq!(records[0].mw, -10.0);
        assert_eq!(records[1].mw, -2.0);
    }

    #[test]
    fn charge_priority_orders_by_rate_then_capacity_then_lowest_soe() {
        let fleet = Fleet::new(vec![
            battery("low_rate", 30.0, 2.0, 0.9, 0.0),
            battery("full", 20.0, 5.0, 0.9, 18.0),
            battery("empty", 20.0, 5.0, 0.9, 1.0),
            battery("big", 40.0, 5.0, 0.9, 20.0),
        ])
        .expect("unique ids");

        let order = prioritize(&fleet, true, false);
        let ids: Vec<&str> = order
            .iter()
            .map(|&i| fleet.batteries()[i].id.as_str())
            .collect();
        assert_eq!(ids, vec!["big", "empty", "full", "low_rate"]);
    }

    #[test]
    fn discharge_priority_prefers_fullest_unit() {
        let fleet = Fleet::new(vec![
            battery("emptier", 20.0, 5.0, 0.9, 4.0),
            battery("fuller", 20.0, 5.0, 0.9, 16.0),
        ])
        .expect("unique ids");

        let order = prioritize(&fleet, false, true);
        assert_eq!(fleet.batteries()[order[0]].id, "fuller");
    }

    #[test]
    fn priority_ties_fall_back_to_insertion_order() {
        let fleet = Fleet::new(vec![
            battery("first", 20.0, 5.0, 0.9, 10.0),
            battery("second", 20.0, 5.0, 0.9, 10.0),
        ])
        .expect("unique ids");

        let order = prioritize(&fleet, true, false);
        assert_eq!(fleet.batteries()[order[0]].id, "first");
        let order = prioritize(&fleet, false, true);
        assert_eq!(fleet.batteries()[order[0]].id, "first");
    }

    #[test]
    fn running_total_resets_between_timesteps() {
        let mut fleet =
            Fleet::new(vec![battery("alpha", 100.0, 8.0, 1.0, 0.0)]).expect("unique ids");
        let opt = optimizer(100.0, 150.0, 8.0);

        let first = opt.step(&mut fleet, &point(1, 50.0));
        let second = opt.step(&mut fleet, &point(2, 50.0));

        // Headroom is per-timestep: the second interval charges at the full
        // budget again instead of inheriting an exhausted total.
        assert_eq!(first[0].mw, -8.0);
        assert_eq!(second[0].mw, -8.0);
    }

    #[test]
    fn run_emits_one_record_per_step_and_battery() {
        let mut fleet = Fleet::new(vec![
            battery("a", 20.0, 10.0, 0.9, 10.0),
            battery("b", 10.0, 5.0, 0.9, 5.0),
        ])
        .expect("unique ids");

        let prices = vec![point(0, 60.0), point(1, 120.0), point(2, 200.0)];
        let records = optimizer(100.0, 150.0, 100.0).run(&mut fleet, &prices);

        assert_eq!(records.len(), 6);
        assert_eq!(records[0].timestamp, prices[0].timestamp);
        assert_eq!(records[5].timestamp, prices[2].timestamp);
    }

    #[test]
    fn empty_price_series_yields_no_records() {
        let mut fleet =
            Fleet::new(vec![battery("alpha", 20.0, 10.0, 0.9, 10.0)]).expect("unique ids");
        let records = optimizer(100.0, 150.0, 100.0).run(&mut fleet, &[]);
        assert!(records.is_empty());
    }

    #[test]
    fn battery_constraint_still_applies_inside_fleet_budget() {
        // Nearly full unit: fleet budget allows 10 MW but energy space only
        // admits (20 - 19.5) / 0.9 MW of charging.
        let mut fleet =
            Fleet::new(vec![battery("alpha", 20.0, 10.0, 0.9, 19.5)]).expect("unique ids");
        let records = optimizer(100.0, 150.0, 100.0).step(&mut fleet, &point(3, 50.0));

        assert!((records[0].mw - (-0.5 / 0.9)).abs() < 1e-9);
        assert!((records[0].soe_after_mwh - 20.0).abs() < 1e-9);
    }

    #[test]
    fn headroom_clamp_edge_cases() {
        assert_eq!(clamp_to_fleet_headroom(-10.0, 0.0, 8.0, 8.0), -8.0);
        assert_eq!(clamp_to_fleet_headroom(-3.0, -4.0, 8.0, 8.0), -3.0);
        assert_eq!(clamp_to_fleet_headroom(-3.0, -8.0, 8.0, 8.0), 0.0);
        assert_eq!(clamp_to_fleet_headroom(5.0, 7.0, 8.0, 8.0), 1.0);
        assert_eq!(clamp_to_fleet_headroom(5.0, 9.0, 8.0, 8.0), 0.0);
        assert_eq!(clamp_to_fleet_headroom(0.0, 0.0, 8.0, 8.0), 0.0);
    }
}
