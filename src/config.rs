//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections except the battery list have defaults matching the baseline
/// scenario. Load from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default fleet.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation horizon and timing parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Synthetic price curve parameters.
    #[serde(default)]
    pub price: PriceConfig,
    /// Threshold strategy parameters.
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Fleet-level power budget.
    #[serde(default)]
    pub fleet: FleetGlobalConfig,
    /// Battery unit definitions (at least one required).
    #[serde(default)]
    pub batteries: Vec<BatteryConfig>,
}

/// Simulation horizon and timing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Market resolution as a duration string: `"60min"`, `"15T"`, `"1h"`.
    pub resolution: String,
    /// Master random seed for the price curve.
    pub seed: u64,
    /// Simulation start date (`YYYY-MM-DD`, midnight). Defaults to today,
    /// which keeps demo runs current but makes output date-dependent; pin a
    /// date for reproducible exports.
    pub start_date: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 7,
            resolution: "60min".to_string(),
            seed: 42,
            start_date: None,
        }
    }
}

impl SimulationConfig {
    /// Parses the resolution string into minutes per step.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the string is not a positive `min`/`T`/`h`
    /// duration.
    pub fn resolution_minutes(&self) -> Result<u32, ConfigError> {
        parse_resolution(&self.resolution)
    }

    /// Duration of one market interval in hours.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the resolution string is invalid.
    pub fn dt_hours(&self) -> Result<f64, ConfigError> {
        Ok(f64::from(self.resolution_minutes()?) / 60.0)
    }

    /// Simulation start timestamp: the configured date at midnight, or
    /// today's midnight when no date is pinned.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `start_date` does not parse as
    /// `YYYY-MM-DD`.
    pub fn start_timestamp(&self) -> Result<NaiveDateTime, ConfigError> {
        let date = match &self.start_date {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| ConfigError {
                field: "simulation.start_date".to_string(),
                message: format!("expected YYYY-MM-DD, got \"{s}\": {e}"),
            })?,
            None => Local::now().date_naive(),
        };
        Ok(date.and_time(NaiveTime::MIN))
    }
}

/// Synthetic price curve parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Off-peak base price ($/MWh).
    pub base_price_mwh: f64,
    /// Evening peak multiplier.
    pub peak_multiplier: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            base_price_mwh: 80.0,
            peak_multiplier: 2.0,
        }
    }
}

/// Threshold strategy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    /// Charge when the price is strictly below this ($/MWh).
    pub charge_threshold: f64,
    /// Discharge when the price is strictly above this ($/MWh).
    pub discharge_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            charge_threshold: 100.0,
            discharge_threshold: 150.0,
        }
    }
}

/// Fleet-level power budget at the grid connection point.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetGlobalConfig {
    /// Maximum aggregate charging power (MW).
    pub max_charge_mw: f64,
    /// Maximum aggregate discharging power (MW).
    pub max_discharge_mw: f64,
}

impl Default for FleetGlobalConfig {
    fn default() -> Self {
        Self {
            max_charge_mw: 100.0,
            max_discharge_mw: 100.0,
        }
    }
}

/// One battery unit definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryConfig {
    /// Unique unit identifier.
    pub id: String,
    /// Energy capacity in MWh (must be > 0).
    pub capacity_mwh: f64,
    /// Maximum charging power in MW.
    pub charge_rate_mw: f64,
    /// Maximum discharging power in MW.
    pub discharge_rate_mw: f64,
    /// Round-trip efficiency (0..=1.0).
    pub efficiency: f64,
    /// Initial state of energy as a percentage of capacity (0-100).
    #[serde(default)]
    pub initial_soe_pct: Option<f64>,
    /// Initial state of energy in MWh. Mutually exclusive with
    /// `initial_soe_pct`.
    #[serde(default)]
    pub initial_soe_mwh: Option<f64>,
}

impl BatteryConfig {
    /// Resolves the starting state of energy in MWh.
    ///
    /// Percentage takes precedence over an absolute value; with neither set,
    /// units start half full.
    pub fn starting_soe_mwh(&self) -> f64 {
        if let Some(pct) = self.initial_soe_pct {
            self.capacity_mwh * (pct / 100.0)
        } else if let Some(mwh) = self.initial_soe_mwh {
            mwh
        } else {
            self.capacity_mwh * 0.5
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"batteries[0].capacity_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Parses a market resolution string into minutes per step.
///
/// Accepts `"<n>min"`, `"<n>T"` (a common timeseries alias for minutes), and
/// `"<n>h"`.
pub fn parse_resolution(s: &str) -> Result<u32, ConfigError> {
    let invalid = |message: String| ConfigError {
        field: "simulation.resolution".to_string(),
        message,
    };

    let trimmed = s.trim();
    let (digits, per_unit) = if let Some(v) = trimmed.strip_suffix("min") {
        (v, 1)
    } else if let Some(v) = trimmed.strip_suffix('T') {
        (v, 1)
    } else if let Some(v) = trimmed.strip_suffix('h') {
        (v, 60)
    } else {
        return Err(invalid(format!(
            "expected a duration like \"60min\" or \"1h\", got \"{s}\""
        )));
    };

    let n: u32 = digits
        .trim()
        .parse()
        .map_err(|_| invalid(format!("invalid duration count in \"{s}\"")))?;
    if n == 0 {
        return Err(invalid("resolution must be positive".to_string()));
    }
    Ok(n * per_unit)
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a mixed three-unit fleet with a fleet
    /// budget tighter than the aggregate unit rating.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig {
                start_date: Some("2025-01-06".to_string()),
                ..SimulationConfig::default()
            },
            price: PriceConfig::default(),
            strategy: StrategyConfig::default(),
            fleet: FleetGlobalConfig {
                max_charge_mw: 20.0,
                max_discharge_mw: 20.0,
            },
            batteries: vec![
                BatteryConfig {
                    id: "alpha".to_string(),
                    capacity_mwh: 20.0,
                    charge_rate_mw: 10.0,
                    discharge_rate_mw: 10.0,
                    efficiency: 0.92,
                    initial_soe_pct: None,
                    initial_soe_mwh: None,
                },
                BatteryConfig {
                    id: "bravo".to_string(),
                    capacity_mwh: 10.0,
                    charge_rate_mw: 5.0,
                    discharge_rate_mw: 5.0,
                    efficiency: 0.90,
                    initial_soe_pct: Some(25.0),
                    initial_soe_mwh: None,
                },
                BatteryConfig {
                    id: "charlie".to_string(),
                    capacity_mwh: 40.0,
                    charge_rate_mw: 8.0,
                    discharge_rate_mw: 12.0,
                    efficiency: 0.88,
                    initial_soe_pct: None,
                    initial_soe_mwh: None,
                },
            ],
        }
    }

    /// Returns the single-unit preset: one mid-size battery, generous fleet
    /// budget.
    pub fn single_unit() -> Self {
        Self {
            simulation: SimulationConfig {
                days: 3,
                start_date: Some("2025-01-06".to_string()),
                ..SimulationConfig::default()
            },
            price: PriceConfig::default(),
            strategy: StrategyConfig::default(),
            fleet: FleetGlobalConfig::default(),
            batteries: vec![BatteryConfig {
                id: "solo".to_string(),
                capacity_mwh: 10.0,
                charge_rate_mw: 5.0,
                discharge_rate_mw: 5.0,
                efficiency: 0.90,
                initial_soe_pct: None,
                initial_soe_mwh: Some(5.0),
            }],
        }
    }

    /// Returns the constrained-fleet preset: the fleet budget binds well
    /// below the aggregate unit rating, so dispatch priority decides who
    /// runs.
    pub fn constrained_fleet() -> Self {
        Self {
            simulation: SimulationConfig {
                seed: 7,
                start_date: Some("2025-01-06".to_string()),
                ..SimulationConfig::default()
            },
            price: PriceConfig {
                peak_multiplier: 2.5,
                ..PriceConfig::default()
            },
            strategy: StrategyConfig::default(),
            fleet: FleetGlobalConfig {
                max_charge_mw: 8.0,
                max_discharge_mw: 8.0,
            },
            batteries: vec![
                BatteryConfig {
                    id: "fast".to_string(),
                    capacity_mwh: 20.0,
                    charge_rate_mw: 10.0,
                    discharge_rate_mw: 10.0,
                    efficiency: 0.92,
                    initial_soe_pct: Some(0.0),
                    initial_soe_mwh: None,
                },
                BatteryConfig {
                    id: "slow".to_string(),
                    capacity_mwh: 10.0,
                    charge_rate_mw: 5.0,
                    discharge_rate_mw: 5.0,
                    efficiency: 0.90,
                    initial_soe_pct: Some(0.0),
                    initial_soe_mwh: None,
                },
            ],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "single_unit", "constrained_fleet"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "single_unit" => Ok(Self::single_unit()),
            "constrained_fleet" => Ok(Self::constrained_fleet()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.days == 0 {
            errors.push(ConfigError {
                field: "simulation.days".into(),
                message: "must be > 0".into(),
            });
        }
        if let Err(e) = s.resolution_minutes() {
            errors.push(e);
        }
        if let Err(e) = s.start_timestamp() {
            errors.push(e);
        }

        let p = &self.price;
        if !p.base_price_mwh.is_finite() || p.base_price_mwh <= 0.0 {
            errors.push(ConfigError {
                field: "price.base_price_mwh".into(),
                message: "must be finite and > 0".into(),
            });
        }
        if !p.peak_multiplier.is_finite() || p.peak_multiplier <= 0.0 {
            errors.push(ConfigError {
                field: "price.peak_multiplier".into(),
                message: "must be finite and > 0".into(),
            });
        }

        let st = &self.strategy;
        if !st.charge_threshold.is_finite() || !st.discharge_threshold.is_finite() {
            errors.push(ConfigError {
                field: "strategy".into(),
                message: "thresholds must be finite".into(),
            });
        } else if st.charge_threshold > st.discharge_threshold {
            errors.push(ConfigError {
                field: "strategy.charge_threshold".into(),
                message: format!(
                    "must be <= strategy.discharge_threshold ({} > {})",
                    st.charge_threshold, st.discharge_threshold
                ),
            });
        }

        let fl = &self.fleet;
        if !fl.max_charge_mw.is_finite() || fl.max_charge_mw < 0.0 {
            errors.push(ConfigError {
                field: "fleet.max_charge_mw".into(),
                message: "must be finite and >= 0".into(),
            });
        }
        if !fl.max_discharge_mw.is_finite() || fl.max_discharge_mw < 0.0 {
            errors.push(ConfigError {
                field: "fleet.max_discharge_mw".into(),
                message: "must be finite and >= 0".into(),
            });
        }

        if self.batteries.is_empty() {
            errors.push(ConfigError {
                field: "batteries".into(),
                message: "at least one battery is required".into(),
            });
        }

        for (i, b) in self.batteries.iter().enumerate() {
            if b.id.trim().is_empty() {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].id"),
                    message: "must not be empty".into(),
                });
            }
            if !b.capacity_mwh.is_finite() || b.capacity_mwh <= 0.0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].capacity_mwh"),
                    message: "must be finite and > 0".into(),
                });
            }
            if !b.charge_rate_mw.is_finite() || b.charge_rate_mw < 0.0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].charge_rate_mw"),
                    message: "must be finite and >= 0".into(),
                });
            }
            if !b.discharge_rate_mw.is_finite() || b.discharge_rate_mw < 0.0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].discharge_rate_mw"),
                    message: "must be finite and >= 0".into(),
                });
            }
            if !b.efficiency.is_finite() || b.efficiency <= 0.0 || b.efficiency > 1.0 {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].efficiency"),
                    message: "must be in (0.0, 1.0]".into(),
                });
            }
            if b.initial_soe_pct.is_some() && b.initial_soe_mwh.is_some() {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].initial_soe_pct"),
                    message: "mutually exclusive with initial_soe_mwh".into(),
                });
            }
            if let Some(pct) = b.initial_soe_pct
                && !(0.0..=100.0).contains(&pct)
            {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].initial_soe_pct"),
                    message: "must be in [0, 100]".into(),
                });
            }
            if let Some(mwh) = b.initial_soe_mwh
                && (!mwh.is_finite() || mwh < 0.0 || mwh > b.capacity_mwh)
            {
                errors.push(ConfigError {
                    field: format!("batteries[{i}].initial_soe_mwh"),
                    message: "must be in [0, capacity_mwh]".into(),
                });
            }
            for other in &self.batteries[..i] {
                if other.id == b.id {
                    errors.push(ConfigError {
                        field: format!("batteries[{i}].id"),
                        message: format!("duplicate id \"{}\"", b.id),
                    });
                    break;
                }
            }
        }

        errors
    }
}
