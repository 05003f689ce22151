// Particle registry
//
// Owns every particle of a reaction. Callers hold `ParticleId` handles and
// borrow particles through the registry.

use crate::error::{Error, Result};
use crate::particle::Particle;

/// Stable handle into a [`ParticleRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub usize);

/// Arena of particles addressed by [`ParticleId`]
#[derive(Debug, Clone, Default)]
pub struct ParticleRegistry {
    particles: Vec<Particle>,
}

impl ParticleRegistry {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// Take ownership of a particle and return its handle
    pub fn add(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        ParticleId(self.particles.len() - 1)
    }

    pub fn get(&self, id: ParticleId) -> Result<&Particle> {
        self.particles.get(id.0).ok_or(Error::UnknownParticle(id))
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Result<&mut Particle> {
        self.particles.get_mut(id.0).ok_or(Error::UnknownParticle(id))
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ParticleId> {
        (0..self.particles.len()).map(ParticleId)
    }

    /// Lowest mass the particle can take given the live state of its daughters.
    ///
    /// An explicit override wins; a decaying particle's floor is the sum of its
    /// daughters' floors; otherwise the distribution's lower support edge, or
    /// the catalog mass for a fixed-mass particle.
    pub fn minimum_mass_possible(&self, id: ParticleId) -> Result<f64> {
        let particle = self.get(id)?;
        if let Some(min) = particle.min_mass_override {
            return Ok(min);
        }
        if !particle.daughters.is_empty() {
            return particle
                .daughters
                .iter()
                .try_fold(0.0, |sum, &d| -> Result<f64> {
                    Ok(sum + self.minimum_mass_possible(d)?)
                });
        }
        Ok(match &particle.mass_dist {
            Some(dist) => dist.min_x(),
            None => particle.pdg_mass,
        })
    }

    /// Highest mass the particle can take; `None` if unbounded by the particle itself.
    pub fn maximum_mass_possible(&self, id: ParticleId) -> Result<Option<f64>> {
        let particle = self.get(id)?;
        if let Some(max) = particle.max_mass_override {
            return Ok(Some(max));
        }
        Ok(match &particle.mass_dist {
            Some(dist) => Some(dist.max_x()),
            None if particle.daughters.is_empty() => Some(particle.pdg_mass),
            None => None,
        })
    }

    /// Put the particle at its minimum possible mass
    pub fn take_minimum_mass(&mut self, id: ParticleId) -> Result<()> {
        let min = self.minimum_mass_possible(id)?;
        self.get_mut(id)?.set_mass(min);
        Ok(())
    }

    /// Put the particle back at its catalog mass
    pub fn take_pdg_mass(&mut self, id: ParticleId) -> Result<()> {
        let particle = self.get_mut(id)?;
        let mass = particle.pdg_mass;
        particle.set_mass(mass);
        Ok(())
    }
}
