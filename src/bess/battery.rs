/// A battery energy storage system with a fixed capacity and power rating.
///
/// `Battery` owns its state of energy (SoE) and enforces rate and
/// energy-content constraints when given a power target.
///
/// # Power Flow Convention (Grid Connection Point)
/// - Negative MW: Charging (absorbing energy from the grid)
/// - Positive MW: Discharging (injecting energy into the grid)
///
/// Efficiency is applied asymmetrically: charging stores `|MW| * dt * eta`,
/// discharging removes `|MW| * dt / eta` from storage.
#[derive(Debug, Clone)]
pub struct Battery {
    /// Unique unit identifier.
    pub id: String,

    /// Energy capacity in megawatt-hours.
    pub capacity_mwh: f64,

    /// Maximum charging power in megawatts (positive value).
    pub max_charge_mw: f64,

    /// Maximum discharging power in megawatts (positive value).
    pub max_discharge_mw: f64,

    /// Round-trip efficiency (0..=1.0).
    pub efficiency: f64,

    /// Current state of energy in megawatt-hours. Mutated only by
    /// [`Battery::update_soe`].
    soe_mwh: f64,
}

impl Battery {
    /// Creates a new battery with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique unit identifier
    /// * `capacity_mwh` - Energy capacity in MWh (must be > 0)
    /// * `max_charge_mw` - Maximum charging power in MW
    /// * `max_discharge_mw` - Maximum discharging power in MW
    /// * `efficiency` - Round-trip efficiency (0..=1.0)
    /// * `initial_soe_mwh` - Starting state of energy in MWh
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero/negative, rates are negative, efficiency
    /// is outside (0, 1], or the initial SoE is outside `[0, capacity]`.
    /// Scenario validation rejects these before construction.
    pub fn new(
        id: String,
        capacity_mwh: f64,
        max_charge_mw: f64,
        max_discharge_mw: f64,
        efficiency: f64,
        initial_soe_mwh: f64,
    ) -> Self {
        assert!(capacity_mwh > 0.0);
        assert!(max_charge_mw >= 0.0 && max_discharge_mw >= 0.0);
        assert!(efficiency > 0.0 && efficiency <= 1.0);
        assert!((0.0..=capacity_mwh).contains(&initial_soe_mwh));

        Self {
            id,
            capacity_mwh,
            max_charge_mw,
            max_discharge_mw,
            efficiency,
            soe_mwh: initial_soe_mwh,
        }
    }

    /// Current state of energy in MWh.
    pub fn soe_mwh(&self) -> f64 {
        self.soe_mwh
    }

    /// Current state of energy as a percentage of capacity.
    pub fn soe_pct(&self) -> f64 {
        self.soe_mwh / self.capacity_mwh * 100.0
    }

    /// Returns the closest feasible grid-side power for a target setpoint.
    ///
    /// Applies the rate limit for the requested direction, then the
    /// energy-content limit derived from the current SoE; whichever bound is
    /// closer to zero binds. A zero target is always feasible as exactly 0.
    pub fn check_constraints(&self, target_mw: f64, dt_hours: f64) -> f64 {
        if target_mw < 0.0 {
            // Charging: both bounds are negative, so max() picks the one
            // allowing less charging.
            let rate_bound = -self.max_charge_mw;
            let space_mwh = self.capacity_mwh - self.soe_mwh;
            let energy_bound = -(space_mwh / (dt_hours * self.efficiency));
            target_mw.max(rate_bound).max(energy_bound)
        } else if target_mw > 0.0 {
            // Discharging: symmetric with min() over positive bounds.
            let rate_bound = self.max_discharge_mw;
            let energy_bound = (self.soe_mwh * self.efficiency) / dt_hours;
            target_mw.min(rate_bound).min(energy_bound)
        } else {
            0.0
        }
    }

    /// Applies a power dispatch and returns the realized grid-side MW.
    ///
    /// The target is first clamped through [`Battery::check_constraints`],
    /// then the physics update runs: charging adds `|MW| * dt * eta` to the
    /// SoE, discharging removes `|MW| * dt / eta`. The resulting SoE is
    /// clamped to `[0, capacity]` as a floating-point safety net.
    ///
    /// This is the only mutator of the SoE; it never fails.
    pub fn update_soe(&mut self, mw: f64, dt_hours: f64) -> f64 {
        let feasible_mw = self.check_constraints(mw, dt_hours);

        if feasible_mw < 0.0 {
            let energy_in = feasible_mw.abs() * dt_hours * self.efficiency;
            self.soe_mwh += energy_in;
        } else if feasible_mw > 0.0 {
            let energy_out = feasible_mw.abs() * dt_hours / self.efficiency;
            self.soe_mwh -= energy_out;
        }

        self.soe_mwh = self.soe_mwh.clamp(0.0, self.capacity_mwh);

        feasible_mw
    }
}
