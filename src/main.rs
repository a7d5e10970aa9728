//! Fleet simulator entry point: CLI wiring and config-driven runs.

use std::path::Path;
use std::process;

use bess_fleet_sim::bess::{Battery, Fleet, FleetError};
use bess_fleet_sim::config::ScenarioConfig;
use bess_fleet_sim::io::export::{export_dispatch_csv, export_price_csv};
use bess_fleet_sim::market::PriceEngine;
use bess_fleet_sim::sim::kpi::KpiReport;
use bess_fleet_sim::sim::optimizer::{Optimizer, StrategyParams};
use tracing::info;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    days_override: Option<usize>,
    results_out: Option<String>,
    prices_out: Option<String>,
}

fn print_help() {
    eprintln!("bess-fleet-sim — battery fleet dispatch economics simulator");
    eprintln!();
    eprintln!("Usage: bess-fleet-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>     Load scenario from TOML config file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline)");
    eprintln!("  --seed <u64>          Override price curve random seed");
    eprintln!("  --days <n>            Override simulation horizon in days");
    eprintln!("  --results-out <path>  Export dispatch records to CSV");
    eprintln!("  --prices-out <path>   Export the generated price series to CSV");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("The MARKET_RESOLUTION environment variable (e.g. \"15min\") overrides");
    eprintln!("the scenario's market resolution.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        days_override: None,
        results_out: None,
        prices_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--days" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --days requires a positive integer argument");
                    process::exit(1);
                }
                if let Ok(d) = args[i].parse::<usize>() {
                    cli.days_override = Some(d);
                } else {
                    eprintln!("error: --days value \"{}\" is not a valid integer", args[i]);
                    process::exit(1);
                }
            }
            "--results-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --results-out requires a path argument");
                    process::exit(1);
                }
                cli.results_out = Some(args[i].clone());
            }
            "--prices-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --prices-out requires a path argument");
                    process::exit(1);
                }
                cli.prices_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Builds the fleet from validated battery configuration entries.
fn build_fleet(cfg: &ScenarioConfig) -> Result<Fleet, FleetError> {
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
    Fleet::new(batteries)
}

fn main() {
    tracing_subscriber::fmt().without_time().compact().init();

    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply overrides
    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(days) = cli.days_override {
        scenario.simulation.days = days;
    }
    if let Ok(resolution) = std::env::var("MARKET_RESOLUTION") {
        scenario.simulation.resolution = resolution;
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Both calls are covered by validate() above.
    let (step_minutes, start) = match (
        scenario.simulation.resolution_minutes(),
        scenario.simulation.start_timestamp(),
    ) {
        (Ok(m), Ok(s)) => (m, s),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let dt_hours = f64::from(step_minutes) / 60.0;

    let mut fleet = match build_fleet(&scenario) {
        Ok(fleet) => fleet,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    info!(
        batteries = fleet.count(),
        capacity_mwh = fleet.total_capacity_mwh(),
        "loaded battery fleet"
    );
    info!(
        resolution = %scenario.simulation.resolution,
        dt_hours,
        "market resolution"
    );

    let sim = &scenario.simulation;
    let mut price_engine = PriceEngine::new(
        scenario.price.base_price_mwh,
        scenario.price.peak_multiplier,
        sim.seed,
    );
    let prices = price_engine.generate(start, sim.days, step_minutes);
    info!(points = prices.len(), days = sim.days, "generated price series");

    let optimizer = Optimizer::new(StrategyParams {
        charge_threshold: scenario.strategy.charge_threshold,
        discharge_threshold: scenario.strategy.discharge_threshold,
        fleet_max_charge_mw: scenario.fleet.max_charge_mw,
        fleet_max_discharge_mw: scenario.fleet.max_discharge_mw,
        dt_hours,
    });
    info!("running threshold strategy");
    let records = optimizer.run(&mut fleet, &prices);

    let kpi = KpiReport::from_records(&records, fleet.total_capacity_mwh(), sim.days);
    println!("{kpi}");

    println!("Final state of energy:");
    for status in fleet.status() {
        println!(
            "  {}: {:.2} MWh ({:.1}%)",
            status.id, status.soe_mwh, status.soe_pct
        );
    }

    if let Some(ref path) = cli.results_out {
        if let Err(e) = export_dispatch_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write results CSV: {e}");
            process::exit(1);
        }
        info!(path = %path, "dispatch records written");
    }
    if let Some(ref path) = cli.prices_out {
        if let Err(e) = export_price_csv(&prices, Path::new(path)) {
            eprintln!("error: failed to write prices CSV: {e}");
            process::exit(1);
        }
        info!(path = %path, "price series written");
    }
}
