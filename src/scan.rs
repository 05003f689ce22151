// Diagnostic scans of a channel's cross section and weight density
use serde::Serialize;
use std::fmt;

use crate::config::IntegrationSettings;
use crate::error::{Error, Result};
use crate::integrator::integrate;
use crate::kinematics::ChannelMasses;
use crate::maximum::weight_density;
use crate::model::{CrossSectionModel, StKinematics};

/// Uniform binning of an axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Binning {
    pub n: usize,
    pub min: f64,
    pub max: f64,
}

impl Binning {
    pub fn new(n: usize, min: f64, max: f64) -> Result<Self> {
        if n == 0 || !(min < max) {
            return Err(Error::InvalidConfig(format!(
                "binning needs at least one bin and min < max, got {} bins on [{}, {}]",
                n, min, max
            )));
        }
        Ok(Self { n, min, max })
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.n as f64
    }

    pub fn centre(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.width()
    }

    pub fn centres(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.centre(i)).collect()
    }
}

/// One-dimensional scan result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanTable {
    pub name: String,
    pub x_label: String,
    pub x: Vec<f64>,
    pub values: Vec<f64>,
}

impl ScanTable {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Largest tabulated value
    pub fn max_value(&self) -> f64 {
        self.values.iter().cloned().fold(0.0, f64::max)
    }
}

impl fmt::Display for ScanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan: {}", self.name)?;
        for (x, v) in self.x.iter().zip(&self.values) {
            writeln!(f, "  {} = {:.6}  {:.6e}", self.x_label, x, v)?;
        }
        Ok(())
    }
}

/// Weight density on a (W, cos(theta)) grid; `values[i][j]` is at `w[i]`, `costh[j]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridTable {
    pub w: Vec<f64>,
    pub costh: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl GridTable {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flat_map(|row| row.iter().cloned())
            .fold(0.0, f64::max)
    }
}

fn integrated_at_w(
    model: &dyn CrossSectionModel,
    masses: &ChannelMasses,
    w: f64,
    settings: &IntegrationSettings,
) -> f64 {
    if !(w > masses.threshold()) {
        return 0.0;
    }
    let integrand = |costh: f64| {
        let t = masses.t_from_costh(costh, w);
        let kin = StKinematics::new(w, t, 0.0, masses.target, masses.meson, masses.baryon);
        let value = model.phase_space_factor_costh(&kin) * model.matrix_elements_squared_t(&kin);
        if value.is_nan() {
            0.0
        } else {
            value
        }
    };
    integrate(integrand, -1.0, 1.0, settings).value
}

/// Total cross section vs W: dsigma/dcos(theta) integrated over [-1, 1] at each bin centre
pub fn integrated_xsection_vs_w(
    model: &dyn CrossSectionModel,
    masses: &ChannelMasses,
    binning: &Binning,
    settings: &IntegrationSettings,
) -> ScanTable {
    let x = binning.centres();
    let values = x
        .iter()
        .map(|&w| integrated_at_w(model, masses, w, settings))
        .collect();
    ScanTable {
        name: format!("{} integrated cross section", model.name()),
        x_label: "W".to_string(),
        x,
        values,
    }
}

/// Total cross section vs s, with W = sqrt(s) at each bin centre
pub fn integrated_xsection_vs_s(
    model: &dyn CrossSectionModel,
    masses: &ChannelMasses,
    binning: &Binning,
    settings: &IntegrationSettings,
) -> ScanTable {
    let x = binning.centres();
    let values = x
        .iter()
        .map(|&s| integrated_at_w(model, masses, s.max(0.0).sqrt(), settings))
        .collect();
    ScanTable {
        name: format!("{} integrated cross section", model.name()),
        x_label: "s".to_string(),
        x,
        values,
    }
}

/// Largest dsigma/dt times the t range in each W bin.
///
/// 100 t points between t0 and tmax of the bin centre are evaluated at the
/// bin centre and at both bin edges.
pub fn max_xsection_vs_w(model: &dyn CrossSectionModel, masses: &ChannelMasses, binning: &Binning) -> ScanTable {
    const T_POINTS: usize = 100;
    let half = 0.5 * binning.width();
    let x = binning.centres();
    let values = x
        .iter()
        .map(|&centre| {
            if centre < masses.w_min {
                return 0.0;
            }
            let (t_hi, t_lo) = (masses.t0(centre), masses.tmax(centre));
            if t_hi.is_nan() || t_lo.is_nan() {
                return 0.0;
            }
            let range = t_hi - t_lo;
            let step = (t_lo - t_hi) / T_POINTS as f64;
            let mut best: f64 = 0.0;
            for k in 0..T_POINTS {
                let t = t_hi + k as f64 * step;
                for w in [centre, centre + half, centre - half] {
                    if w < masses.w_min {
                        continue;
                    }
                    let kin = StKinematics::new(w, t, 0.0, masses.target, masses.meson, masses.baryon);
                    let value = model.differential_xsect(&kin) * range;
                    if value > best {
                        best = value;
                    }
                }
            }
            best
        })
        .collect();
    ScanTable {
        name: format!("{} maximum dsigma/dt x t range", model.name()),
        x_label: "W".to_string(),
        x,
        values,
    }
}

/// Weight density at every (W, cos(theta)) bin centre
pub fn weight_density_grid(
    model: &dyn CrossSectionModel,
    masses: &ChannelMasses,
    w_bins: &Binning,
    costh_bins: &Binning,
) -> GridTable {
    let w = w_bins.centres();
    let costh = costh_bins.centres();
    let values = w
        .iter()
        .map(|&wi| costh.iter().map(|&c| weight_density(model, masses, wi, c)).collect())
        .collect();
    GridTable { w, costh, values }
}
