use chrono::{Duration, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Lower clamp on generated prices ($/MWh).
pub const PRICE_FLOOR_MWH: f64 = 50.0;
/// Upper clamp on generated prices ($/MWh).
pub const PRICE_CAP_MWH: f64 = 250.0;
/// Half-width of the uniform noise band ($/MWh).
const NOISE_BAND_MWH: f64 = 10.0;

/// One market interval: start time and clearing price.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price_mwh: f64,
}

/// Synthetic day-ahead price generator.
///
/// Produces a time-of-day shaped curve: a base price off-peak, a scaled
/// morning ramp, and a full peak multiplier in the evening window, with
/// uniform noise on top. Prices are clamped to
/// `[PRICE_FLOOR_MWH, PRICE_CAP_MWH]` and rounded to cents.
///
/// The optimizer makes no assumptions about this shape; any time-ordered
/// series works.
#[derive(Debug, Clone)]
pub struct PriceEngine {
    /// Off-peak base price ($/MWh).
    pub base_price_mwh: f64,

    /// Multiplier applied during the evening peak window.
    pub peak_multiplier: f64,

    /// Random number generator for price noise.
    rng: StdRng,
}

impl PriceEngine {
    /// Creates a price engine with a seeded noise source.
    ///
    /// The same seed and parameters reproduce the same series.
    pub fn new(base_price_mwh: f64, peak_multiplier: f64, seed: u64) -> Self {
        Self {
            base_price_mwh,
            peak_multiplier,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates an evenly spaced, strictly time-ordered price series
    /// covering `[start, start + days)` at `step_minutes` resolution.
    pub fn generate(&mut self, start: NaiveDateTime, days: usize, step_minutes: u32) -> Vec<PricePoint> {
        let step = Duration::minutes(i64::from(step_minutes));
        let end = start + Duration::days(days as i64);

        let mut points = Vec::new();
        let mut current = start;
        while current < end {
            let multiplier = time_of_day_multiplier(current.hour(), self.peak_multiplier);
            let noise = self.rng.random_range(-NOISE_BAND_MWH..=NOISE_BAND_MWH);

            let price = (self.base_price_mwh * multiplier + noise)
                .clamp(PRICE_FLOOR_MWH, PRICE_CAP_MWH);

            points.push(PricePoint {
                timestamp: current,
                price_mwh: (price * 100.0).round() / 100.0,
            });
            current += step;
        }

        points
    }
}

/// Time-of-day price shape: 1.0 off-peak, a scaled morning ramp in 07-09,
/// the full peak multiplier in 17-21.
fn time_of_day_multiplier(hour: u32, peak_multiplier: f64) -> f64 {
    if (7..9).contains(&hour) {
        1.8 * (peak_multiplier / 2.0)
    } else if (17..21).contains(&hour) {
        peak_multiplier
    } else {
        1.0
    }
}
