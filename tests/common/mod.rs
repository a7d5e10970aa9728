//! Shared test fixtures for integration tests.

use bess_fleet_sim::bess::{Battery, Fleet};
use bess_fleet_sim::config::ScenarioConfig;
use bess_fleet_sim::market::{PriceEngine, PricePoint};
use bess_fleet_sim::sim::optimizer::{Optimizer, StrategyParams};
use bess_fleet_sim::sim::types::DispatchRecord;

/// Builds the fleet described by a scenario's battery entries.
pub fn build_fleet(cfg: &ScenarioConfig) -> Fleet {
    let batteries = cfg
        .batteries
        .iter()
        .map(|b| {
            Battery::new(
                b.id.clone(),
                b.capacity_mwh,
                b.charge_rate_mw,
                b.discharge_rate_mw,
                b.efficiency,
                b.starting_soe_mwh(),
            )
        })
        .collect();
    Fleet::new(batteries).expect("scenario fixtures use unique ids")
}

/// Generates the scenario's price series.
pub fn generate_prices(cfg: &ScenarioConfig) -> Vec<PricePoint> {
    let sim = &cfg.simulation;
    let start = sim.start_timestamp().expect("fixtures pin a start date");
    let minutes = sim.resolution_minutes().expect("fixtures use valid resolutions");
    let mut engine = PriceEngine::new(cfg.price.base_price_mwh, cfg.price.peak_multiplier, sim.seed);
    engine.generate(start, sim.days, minutes)
}

/// Builds the optimizer configured by a scenario.
pub fn build_optimizer(cfg: &ScenarioConfig) -> Optimizer {
    Optimizer::new(StrategyParams {
        charge_threshold: cfg.strategy.charge_threshold,
        discharge_threshold: cfg.strategy.discharge_threshold,
        fleet_max_charge_mw: cfg.fleet.max_charge_mw,
        fleet_max_discharge_mw: cfg.fleet.max_discharge_mw,
        dt_hours: cfg.simulation.dt_hours().expect("fixtures use valid resolutions"),
    })
}

/// Runs a scenario end to end.
///
/// Returns `(prices, records, fleet)` with the fleet in its final state.
pub fn run_scenario(cfg: &ScenarioConfig) -> (Vec<PricePoint>, Vec<DispatchRecord>, Fleet) {
    let mut fleet = build_fleet(cfg);
    let prices = generate_prices(cfg);
    let records = build_optimizer(cfg).run(&mut fleet, &prices);
    (prices, records, fleet)
}
