//! Bounded rejection sampling of a particle's dynamic mass.
//!
//! A candidate is drawn from the particle's distribution over
//! `[min_range, max_range]` until it reaches the particle's minimum possible
//! mass. The floor is re-evaluated before every draw because it can depend on
//! the live state of other particles. Retries are capped by
//! [`Config::max_mass_attempts`](crate::config::Config).

use rand::Rng;
use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::registry::{ParticleId, ParticleRegistry};

/// Optional overrides of the sampling window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassRange {
    /// Lower edge; defaults to the minimum possible mass
    pub min: Option<f64>,
    /// Upper edge; defaults to the maximum possible mass
    pub max: Option<f64>,
}

impl MassRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassOutcome {
    /// Mass was locked; nothing changed
    Locked,
    /// No distribution attached; nothing changed
    NoDistribution,
    /// A candidate was accepted after `attempts` draws
    Sampled { attempts: usize },
    /// Sampling window was empty; mass set to the window's lower edge
    Degenerate,
    /// Every attempt fell below the floor; mass clamped to the floor
    Exhausted { attempts: usize },
}

/// Result of one dynamic-mass determination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassDraw {
    pub mass: f64,
    pub weight: f64,
    pub outcome: MassOutcome,
}

/// Draw a new dynamic mass for `id` and move it onto the new mass shell,
/// keeping its three-momentum.
pub fn determine_dynamic_mass<R: Rng + ?Sized>(
    registry: &mut ParticleRegistry,
    id: ParticleId,
    range: MassRange,
    config: &Config,
    rng: &mut R,
) -> Result<MassDraw> {
    let particle = registry.get(id)?;
    if particle.is_mass_locked() {
        return Ok(MassDraw {
            mass: particle.mass(),
            weight: particle.mass_weight,
            outcome: MassOutcome::Locked,
        });
    }
    let dist = match &particle.mass_dist {
        Some(dist) => dist,
        None => {
            return Ok(MassDraw {
                mass: particle.mass(),
                weight: particle.mass_weight,
                outcome: MassOutcome::NoDistribution,
            })
        }
    };

    let mut min_possible = registry.minimum_mass_possible(id)?;
    let min_range = range.min.unwrap_or(min_possible);
    let max_range = match range.max {
        Some(max) => max,
        None => registry.maximum_mass_possible(id)?.unwrap_or_else(|| dist.max_x()),
    };

    let draw = if min_range > max_range {
        warn!(
            pdg = particle.pdg,
            min_range, max_range, "degenerate mass range, using lower edge"
        );
        MassDraw {
            mass: min_range,
            weight: 1.0,
            outcome: MassOutcome::Degenerate,
        }
    } else {
        let mut accepted = None;
        for attempt in 1..=config.max_mass_attempts {
            min_possible = registry.minimum_mass_possible(id)?;
            let sample = dist.sample(min_range, max_range, rng);
            if sample.mass >= min_possible {
                accepted = Some(MassDraw {
                    mass: sample.mass,
                    weight: sample.weight,
                    outcome: MassOutcome::Sampled { attempts: attempt },
                });
                break;
            }
        }
        accepted.unwrap_or_else(|| {
            warn!(
                pdg = particle.pdg,
                attempts = config.max_mass_attempts,
                min_possible,
                "no mass candidate reached the threshold, clamping"
            );
            MassDraw {
                mass: min_possible,
                weight: 1.0,
                outcome: MassOutcome::Exhausted {
                    attempts: config.max_mass_attempts,
                },
            }
        })
    };

    let particle = registry.get_mut(id)?;
    particle.set_mass(draw.mass);
    particle.mass_weight = draw.weight;
    Ok(draw)
}
