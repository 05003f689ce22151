use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// One draw from a mass distribution together with its importance weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassSample {
    pub mass: f64,
    /// Weight relative to the sampling envelope; 1 for exact samplers.
    pub weight: f64,
}

/// Mass distributions that can be attached to a particle - simplified enum approach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MassDistribution {
    /// Uniform on [min, max]
    Flat { min: f64, max: f64 },
    /// Non-relativistic Breit-Wigner truncated to [min, max], sampled exactly
    BreitWigner {
        mass: f64,
        width: f64,
        min: f64,
        max: f64,
    },
    /// Relativistic Breit-Wigner sampled from a flat envelope; the sample weight
    /// is the line shape normalised to 1 at the pole mass.
    RelativisticBreitWigner {
        mass: f64,
        width: f64,
        min: f64,
        max: f64,
    },
    /// Piecewise-linear density through the points (x, p)
    Tabulated { x: Vec<f64>, p: Vec<f64> },
}

impl MassDistribution {
    pub fn new_flat(min: f64, max: f64) -> Result<Self> {
        check_range(min, max)?;
        Ok(Self::Flat { min, max })
    }

    pub fn new_breit_wigner(mass: f64, width: f64, min: f64, max: f64) -> Result<Self> {
        check_range(min, max)?;
        check_width(width)?;
        Ok(Self::BreitWigner { mass, width, min, max })
    }

    pub fn new_relativistic_breit_wigner(mass: f64, width: f64, min: f64, max: f64) -> Result<Self> {
        check_range(min, max)?;
        check_width(width)?;
        Ok(Self::RelativisticBreitWigner { mass, width, min, max })
    }

    pub fn new_tabulated(x: Vec<f64>, p: Vec<f64>) -> Result<Self> {
        if x.len() < 2 || x.len() != p.len() {
            return Err(Error::InvalidDistribution(format!(
                "tabulated distribution needs matching x/p with at least 2 points, got {} and {}",
                x.len(),
                p.len()
            )));
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(Error::InvalidDistribution(
                "tabulated x values must be strictly increasing".to_string(),
            ));
        }
        if p.iter().any(|&v| !(v >= 0.0)) {
            return Err(Error::InvalidDistribution(
                "tabulated densities must be non-negative".to_string(),
            ));
        }
        let dist = Self::Tabulated { x, p };
        if !(dist.cdf(dist.max_x()) > 0.0) {
            return Err(Error::InvalidDistribution(
                "tabulated density integrates to zero".to_string(),
            ));
        }
        Ok(dist)
    }

    /// Lower edge of the support
    pub fn min_x(&self) -> f64 {
        match self {
            Self::Flat { min, .. }
            | Self::BreitWigner { min, .. }
            | Self::RelativisticBreitWigner { min, .. } => *min,
            Self::Tabulated { x, .. } => x[0],
        }
    }

    /// Upper edge of the support
    pub fn max_x(&self) -> f64 {
        match self {
            Self::Flat { max, .. }
            | Self::BreitWigner { max, .. }
            | Self::RelativisticBreitWigner { max, .. } => *max,
            Self::Tabulated { x, .. } => x[x.len() - 1],
        }
    }

    /// Unnormalised density at `m` (zero outside the support)
    pub fn density(&self, m: f64) -> f64 {
        if m < self.min_x() || m > self.max_x() {
            return 0.0;
        }
        match self {
            Self::Flat { .. } => 1.0,
            Self::BreitWigner { mass, width, .. } => {
                let half = 0.5 * width;
                half * half / ((m - mass) * (m - mass) + half * half)
            }
            Self::RelativisticBreitWigner { mass, width, .. } => relativistic_shape(m, *mass, *width),
            Self::Tabulated { x, p } => {
                let i = segment_index(x, m);
                let f = (m - x[i]) / (x[i + 1] - x[i]);
                p[i] + f * (p[i + 1] - p[i])
            }
        }
    }

    /// Sample a mass restricted to [lo, hi] intersected with the support.
    ///
    /// When the intersection is empty the nearest support edge is returned
    /// with zero weight.
    pub fn sample<R: Rng + ?Sized>(&self, lo: f64, hi: f64, rng: &mut R) -> MassSample {
        let lo = lo.max(self.min_x());
        let hi = hi.min(self.max_x());
        if !(lo < hi) {
            let mass = if lo > hi { hi } else { lo };
            let weight = if lo == hi { 1.0 } else { 0.0 };
            return MassSample { mass, weight };
        }

        match self {
            Self::Flat { .. } => MassSample {
                mass: rng.gen_range(lo..hi),
                weight: 1.0,
            },
            Self::BreitWigner { mass, width, .. } => {
                let cdf = |m: f64| 0.5 + (2.0 * (m - mass) / width).atan() / PI;
                let u = cdf(lo) + rng.gen::<f64>() * (cdf(hi) - cdf(lo));
                let m = mass + 0.5 * width * (PI * (u - 0.5)).tan();
                MassSample {
                    mass: m.max(lo).min(hi),
                    weight: 1.0,
                }
            }
            Self::RelativisticBreitWigner { mass, width, .. } => {
                let m = rng.gen_range(lo..hi);
                MassSample {
                    mass: m,
                    weight: relativistic_shape(m, *mass, *width),
                }
            }
            Self::Tabulated { .. } => {
                let (c_lo, c_hi) = (self.cdf(lo), self.cdf(hi));
                if !(c_hi > c_lo) {
                    return MassSample { mass: lo, weight: 0.0 };
                }
                let u = c_lo + rng.gen::<f64>() * (c_hi - c_lo);
                MassSample {
                    mass: self.inverse_cdf(u).max(lo).min(hi),
                    weight: 1.0,
                }
            }
        }
    }

    // Unnormalised cumulative integral of a tabulated density
    fn cdf(&self, m: f64) -> f64 {
        match self {
            Self::Tabulated { x, p } => {
                let m = m.max(x[0]).min(x[x.len() - 1]);
                let i = segment_index(x, m);
                let mut total = 0.0;
                for j in 0..i {
                    total += 0.5 * (p[j] + p[j + 1]) * (x[j + 1] - x[j]);
                }
                let d = m - x[i];
                let slope = (p[i + 1] - p[i]) / (x[i + 1] - x[i]);
                total + p[i] * d + 0.5 * slope * d * d
            }
            _ => unreachable!("cdf is only tabulated for Tabulated distributions"),
        }
    }

    fn inverse_cdf(&self, u: f64) -> f64 {
        match self {
            Self::Tabulated { x, p } => {
                let mut cumulative = 0.0;
                for i in 0..x.len() - 1 {
                    let dx = x[i + 1] - x[i];
                    let area = 0.5 * (p[i] + p[i + 1]) * dx;
                    if u <= cumulative + area || i == x.len() - 2 {
                        let r = (u - cumulative).max(0.0);
                        let slope = (p[i + 1] - p[i]) / dx;
                        // Root of p_i d + slope d^2 / 2 = r in its cancellation-free form
                        let denom = p[i] + (p[i] * p[i] + 2.0 * slope * r).max(0.0).sqrt();
                        let d = if denom > 0.0 { 2.0 * r / denom } else { 0.0 };
                        return x[i] + d.min(dx);
                    }
                    cumulative += area;
                }
                x[x.len() - 1]
            }
            _ => unreachable!("inverse_cdf is only tabulated for Tabulated distributions"),
        }
    }
}

fn relativistic_shape(m: f64, mass: f64, width: f64) -> f64 {
    let mg = mass * width;
    let d = m * m - mass * mass;
    mg * mg / (d * d + mg * mg)
}

fn segment_index(x: &[f64], m: f64) -> usize {
    let idx = x.partition_point(|&v| v <= m);
    idx.saturating_sub(1).min(x.len() - 2)
}

fn check_range(min: f64, max: f64) -> Result<()> {
    if !(min < max) {
        return Err(Error::InvalidDistribution(format!(
            "support [{}, {}] is empty",
            min, max
        )));
    }
    Ok(())
}

fn check_width(width: f64) -> Result<()> {
    if !(width > 0.0) {
        return Err(Error::InvalidDistribution(format!(
            "width must be positive, got {}",
            width
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_flat_samples_inside_requested_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = MassDistribution::new_flat(0.2, 2.0).unwrap();
        for _ in 0..1000 {
            let s = dist.sample(0.5, 0.7, &mut rng);
            assert!(s.mass >= 0.5 && s.mass < 0.7);
            assert_eq!(s.weight, 1.0);
        }
    }

    #[test]
    fn test_breit_wigner_truncation_and_peak() {
        let mut rng = StdRng::seed_from_u64(2);
        let dist = MassDistribution::new_breit_wigner(0.775, 0.149, 0.28, 1.5).unwrap();
        let mut near_peak = 0;
        let n = 5000;
        for _ in 0..n {
            let s = dist.sample(0.28, 1.5, &mut rng);
            assert!(s.mass >= 0.28 && s.mass <= 1.5);
            if (s.mass - 0.775).abs() < 0.0745 {
                near_peak += 1;
            }
        }
        // Roughly half of a Cauchy lies within one half-width of the pole
        let frac = near_peak as f64 / n as f64;
        assert!(frac > 0.4 && frac < 0.65, "fraction near peak {}", frac);
    }

    #[test]
    fn test_relativistic_weight_is_envelope_ratio() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = MassDistribution::new_relativistic_breit_wigner(1.02, 0.004, 0.99, 1.1).unwrap();
        for _ in 0..1000 {
            let s = dist.sample(0.99, 1.1, &mut rng);
            assert!(s.weight > 0.0 && s.weight <= 1.0);
            assert!((s.weight - dist.density(s.mass)).abs() < 1e-12);
        }
        assert!((dist.density(1.02) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tabulated_triangle_mean() {
        let mut rng = StdRng::seed_from_u64(4);
        // Rising triangle on [0, 1]: mean 2/3
        let dist = MassDistribution::new_tabulated(vec![0.0, 1.0], vec![0.0, 2.0]).unwrap();
        let n = 20000;
        let mean: f64 = (0..n).map(|_| dist.sample(0.0, 1.0, &mut rng).mass).sum::<f64>() / n as f64;
        assert!((mean - 2.0 / 3.0).abs() < 0.01, "mean {}", mean);
    }

    #[test]
    fn test_tabulated_respects_subrange() {
        let mut rng = StdRng::seed_from_u64(5);
        let dist =
            MassDistribution::new_tabulated(vec![0.3, 0.6, 0.9, 1.2], vec![1.0, 3.0, 2.0, 0.5]).unwrap();
        for _ in 0..1000 {
            let s = dist.sample(0.7, 1.0, &mut rng);
            assert!(s.mass >= 0.7 && s.mass <= 1.0);
        }
    }

    #[test]
    fn test_invalid_tabulated_rejected() {
        assert!(MassDistribution::new_tabulated(vec![0.0], vec![1.0]).is_err());
        assert!(MassDistribution::new_tabulated(vec![0.0, 0.0], vec![1.0, 1.0]).is_err());
        assert!(MassDistribution::new_tabulated(vec![0.0, 1.0], vec![0.0, 0.0]).is_err());
        assert!(MassDistribution::new_flat(1.0, 1.0).is_err());
        assert!(MassDistribution::new_breit_wigner(0.775, 0.0, 0.3, 1.0).is_err());
    }

    #[test]
    fn test_range_outside_support_returns_edge() {
        let mut rng = StdRng::seed_from_u64(6);
        let dist = MassDistribution::new_flat(0.2, 0.8).unwrap();
        let s = dist.sample(1.0, 2.0, &mut rng);
        assert_eq!(s.mass, 0.8);
        assert_eq!(s.weight, 0.0);
    }

    #[test]
    fn test_deserialize_from_json() {
        let dist: MassDistribution =
            serde_json::from_str(r#"{"type": "BreitWigner", "mass": 0.782, "width": 0.0085, "min": 0.4, "max": 1.2}"#)
                .unwrap();
        assert_eq!(dist.min_x(), 0.4);
        assert_eq!(dist.max_x(), 1.2);
    }

    #[test]
    fn test_send_sync_bounds() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<MassDistribution>();
        assert_sync::<MassDistribution>();
    }
}
