//! Synthetic monthly demand series for seeding demos and exercising the
//! forecast estimators without real sales data.

use rand::Rng;
use std::f64::consts::PI;

/// One tire line in the catalog with the shape parameters of its demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireLine {
    pub name: &'static str,
    /// Demand at month zero, units per month.
    pub base: f64,
    /// Linear growth per month.
    pub trend: f64,
    /// Peak deviation of the annual cycle.
    pub amplitude: f64,
}

/// The four product lines the demos report on.
pub const TIRE_LINES: [TireLine; 4] = [
    TireLine {
        name: "Eagle F1",
        base: 320.0,
        trend: 2.5,
        amplitude: 40.0,
    },
    TireLine {
        name: "Assurance",
        base: 510.0,
        trend: 1.2,
        amplitude: 60.0,
    },
    TireLine {
        name: "Wrangler",
        base: 270.0,
        trend: 3.0,
        amplitude: 55.0,
    },
    TireLine {
        name: "EfficientGrip",
        base: 180.0,
        trend: 0.8,
        amplitude: 25.0,
    },
];

/// Monthly series: `base + trend*i + amplitude*sin(2*pi*i/12)` plus uniform
/// noise in `[-noise, noise]`, floored at zero.
pub fn generate_monthly_demand(
    line: &TireLine,
    months: usize,
    noise: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    (0..months)
        .map(|i| {
            let seasonal = line.amplitude * (2.0 * PI * i as f64 / 12.0).sin();
            let jitter = if noise > 0.0 {
                rng.gen_range(-noise..=noise)
            } else {
                0.0
            };
            (line.base + line.trend * i as f64 + seasonal + jitter).max(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_series_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = generate_monthly_demand(&TIRE_LINES[0], 24, 10.0, &mut rng);
        assert_eq!(series.len(), 24);
        assert!(series.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_deterministic_for_a_fixed_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let first = generate_monthly_demand(&TIRE_LINES[2], 12, 15.0, &mut a);
        let second = generate_monthly_demand(&TIRE_LINES[2], 12, 15.0, &mut b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_noise_free_series_follows_the_model() {
        let mut rng = StdRng::seed_from_u64(0);
        let line = &TIRE_LINES[3];
        let series = generate_monthly_demand(line, 13, 0.0, &mut rng);
        // Month 0 and month 12 sit on the trend line (sin term is zero).
        assert!((series[0] - line.base).abs() < 1e-9);
        assert!((series[12] - (line.base + 12.0 * line.trend)).abs() < 1e-9);
        // Month 3 is the seasonal peak.
        let expected = line.base + 3.0 * line.trend + line.amplitude;
        assert!((series[3] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_floor_at_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let tiny = TireLine {
            name: "test",
            base: 1.0,
            trend: 0.0,
            amplitude: 50.0,
        };
        let series = generate_monthly_demand(&tiny, 12, 0.0, &mut rng);
        assert!(series.iter().all(|v| *v >= 0.0));
        // The seasonal trough would be negative without the floor.
        assert_eq!(series[9], 0.0);
    }
}
