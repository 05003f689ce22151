//! Global maximum of the channel weight density.
//!
//! The density dsigma/dt * dt is maximised over W in [Wmin, Wmax] and the
//! centre-of-mass cos(theta) in [-1, 1], which maps onto the physical t range
//! at every W. The search is repeated with the meson at its minimum possible
//! mass to catch threshold enhancements.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::kinematics::ChannelMasses;
use crate::minimizer::{Minimizer, Variable};
use crate::model::{CrossSectionModel, StKinematics};
use crate::registry::{ParticleId, ParticleRegistry};

/// Cached maximum of a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaximumResult {
    /// Largest weight density found
    pub base: f64,
    /// `base` with the configured headroom applied; used for normalisation
    pub value: f64,
    pub w: f64,
    pub t: f64,
    pub costh: f64,
    /// Maximum came from the search with the meson at its minimum mass
    pub threshold_adopted: bool,
    /// Search found no positive weight and a substitute was used
    pub fallback_used: bool,
}

/// Weight density dsigma/dt * dt at (W, cos(theta)) for a real photon.
///
/// Zero below threshold, outside [w_min, w_max], outside the physical t range
/// or for any NaN intermediate.
pub fn weight_density(model: &dyn CrossSectionModel, masses: &ChannelMasses, w: f64, costh: f64) -> f64 {
    if w.is_nan() || costh.is_nan() {
        return 0.0;
    }
    if w < masses.w_min || w < masses.threshold() || w > masses.w_max {
        return 0.0;
    }
    let t = masses.t_from_costh(costh, w);
    if !(t <= masses.t0(w) && t >= masses.tmax(w)) {
        return 0.0;
    }
    let kin = StKinematics::new(w, t, 0.0, masses.target, masses.meson, masses.baryon);
    let value = model.differential_xsect(&kin) * kin.dt;
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Lower edge of the W search window
fn w_lower(masses: &ChannelMasses) -> f64 {
    masses.w_min.max(masses.threshold())
}

/// Largest weight density on an `n_w` x `n_costh` grid of bin centres
pub fn grid_maximum(
    model: &dyn CrossSectionModel,
    masses: &ChannelMasses,
    n_w: usize,
    n_costh: usize,
) -> (f64, f64, f64) {
    let lo = w_lower(masses);
    let mut best = (0.0, lo, 0.0);
    if !(lo < masses.w_max) {
        return best;
    }
    let dw = (masses.w_max - lo) / n_w as f64;
    let dc = 2.0 / n_costh as f64;
    for i in 0..n_w {
        let w = lo + (i as f64 + 0.5) * dw;
        for j in 0..n_costh {
            let costh = -1.0 + (j as f64 + 0.5) * dc;
            let value = weight_density(model, masses, w, costh);
            if value > best.0 {
                best = (value, w, costh);
            }
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
struct SearchPoint {
    value: f64,
    w: f64,
    costh: f64,
}

fn search(
    model: &dyn CrossSectionModel,
    masses: &ChannelMasses,
    minimizer: &dyn Minimizer,
    config: &Config,
) -> SearchPoint {
    let lo = w_lower(masses);
    let hi = masses.w_max;
    if !(lo < hi) {
        debug!(w_min = lo, w_max = hi, "empty W window, skipping search");
        return SearchPoint {
            value: 0.0,
            w: lo,
            costh: 0.0,
        };
    }

    let range = hi - lo;
    let variables = [
        Variable::new("W", lo + range / 2.0, range / 100.0).with_limits(lo, hi),
        Variable::new("costh", 0.0, 2.0 / 100.0).with_limits(-1.0, 1.0),
    ];
    let objective = |x: &[f64]| -weight_density(model, masses, x[0], x[1]);
    let minimum = minimizer.minimize(&objective, &variables, &config.minimizer);

    debug!(
        backend = minimizer.name(),
        meson_mass = masses.meson,
        w = minimum.x[0],
        costh = minimum.x[1],
        value = -minimum.value,
        calls = minimum.function_calls,
        converged = minimum.converged,
        "maximum search finished"
    );
    SearchPoint {
        value: -minimum.value,
        w: minimum.x[0],
        costh: minimum.x[1],
    }
}

/// Find the maximum weight density of a channel.
///
/// `masses` holds the nominal meson and baryon masses, the photon mass used
/// for the boundaries and the reaction's W window. If the meson's mass can
/// vary, the search is repeated with the meson at its minimum possible mass
/// and the larger maximum is kept. The meson is restored to its prior state
/// before returning, whichever result is kept.
pub fn find_maximum(
    model: &dyn CrossSectionModel,
    registry: &mut ParticleRegistry,
    meson: ParticleId,
    masses: &ChannelMasses,
    minimizer: &dyn Minimizer,
    config: &Config,
) -> Result<MaximumResult> {
    let nominal = search(model, masses, minimizer, config);
    let mut best = nominal;
    let mut best_masses = *masses;
    let mut threshold_adopted = false;

    let particle = registry.get(meson)?;
    let dynamic = particle.mass_dist.is_some() || !particle.daughters.is_empty();
    let mut low_masses = None;
    if dynamic {
        let saved = particle.clone();
        let probe = registry
            .take_minimum_mass(meson)
            .and_then(|_| registry.get(meson).map(|p| p.mass()));
        *registry.get_mut(meson)? = saved;
        let min_mass = probe?;

        if min_mass < masses.meson {
            let low = masses.with_meson_mass(min_mass);
            let at_threshold = search(model, &low, minimizer, config);
            if at_threshold.value > best.value {
                info!(
                    nominal = nominal.value,
                    threshold = at_threshold.value,
                    meson_mass = min_mass,
                    "adopting minimum-mass maximum"
                );
                best = at_threshold;
                best_masses = low;
                threshold_adopted = true;
            }
            low_masses = Some(low);
        }
    }

    let mut fallback_used = false;
    let base = if best.value > 0.0 {
        best.value
    } else {
        fallback_used = true;
        let mut grid = grid_maximum(model, masses, 50, 50);
        if let Some(low) = &low_masses {
            let low_grid = grid_maximum(model, low, 50, 50);
            if low_grid.0 > grid.0 {
                grid = low_grid;
                best_masses = *low;
            }
        }
        if grid.0 > 0.0 {
            warn!(
                grid = grid.0,
                margin = config.failed_search_margin,
                "maximum search found no positive weight, using grid value"
            );
            best = SearchPoint {
                value: grid.0,
                w: grid.1,
                costh: grid.2,
            };
            grid.0 * config.failed_search_margin
        } else {
            warn!(
                fallback = config.fallback_maximum,
                "maximum search found no positive weight anywhere, using fallback maximum"
            );
            config.fallback_maximum
        }
    };

    let result = MaximumResult {
        base,
        value: base * config.max_headroom,
        w: best.w,
        t: best_masses.t_from_costh(best.costh, best.w),
        costh: best.costh,
        threshold_adopted,
        fallback_used,
    };
    info!(
        max = result.value,
        w = result.w,
        t = result.t,
        "channel maximum"
    );
    Ok(result)
}
