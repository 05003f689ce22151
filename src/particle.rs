use nalgebra::Vector3;

use crate::lorentz::LorentzVector;
use crate::registry::ParticleId;
use crate::sdme::SpinDensityMatrix;
use crate::stats::MassDistribution;

/// True for baryon PDG codes (non-zero thousands digit, excluding nuclei).
pub fn is_baryon(pdg: i32) -> bool {
    let code = pdg.unsigned_abs();
    code < 1_000_000_000 && (code / 1000) % 10 != 0
}

/// A particle taking part in a reaction: identity, current four-momentum and
/// mass bookkeeping.
#[derive(Debug, Clone)]
pub struct Particle {
    pub pdg: i32,
    p4: LorentzVector,
    /// Catalog mass
    pub pdg_mass: f64,
    dynamic_mass: f64,
    /// Importance weight of the last mass draw
    pub mass_weight: f64,
    pub mass_dist: Option<MassDistribution>,
    mass_locked: bool,
    /// Decay products, if this particle decays within the reaction
    pub daughters: Vec<ParticleId>,
    pub min_mass_override: Option<f64>,
    pub max_mass_override: Option<f64>,
    /// Spin of the SDME capability, if the particle declares one
    pub sdme_spin: Option<u32>,
    sdme: Option<SpinDensityMatrix>,
}

impl Particle {
    /// New particle at rest with its catalog mass
    pub fn new(pdg: i32, pdg_mass: f64) -> Self {
        Self {
            pdg,
            p4: LorentzVector::at_rest(pdg_mass),
            pdg_mass,
            dynamic_mass: pdg_mass,
            mass_weight: 1.0,
            mass_dist: None,
            mass_locked: false,
            daughters: Vec::new(),
            min_mass_override: None,
            max_mass_override: None,
            sdme_spin: None,
            sdme: None,
        }
    }

    pub fn with_mass_distribution(mut self, dist: MassDistribution) -> Self {
        self.mass_dist = Some(dist);
        self
    }

    pub fn with_sdme_spin(mut self, spin: u32) -> Self {
        self.sdme_spin = Some(spin);
        self
    }

    pub fn with_daughters(mut self, daughters: Vec<ParticleId>) -> Self {
        self.daughters = daughters;
        self
    }

    pub fn is_baryon(&self) -> bool {
        is_baryon(self.pdg)
    }

    pub fn p4(&self) -> &LorentzVector {
        &self.p4
    }

    pub fn mass(&self) -> f64 {
        self.dynamic_mass
    }

    /// Set the four-momentum; the dynamic mass follows its invariant mass.
    pub fn set_p4(&mut self, p4: LorentzVector) {
        self.p4 = p4;
        self.dynamic_mass = p4.mass();
    }

    pub fn set_xyzt(&mut self, px: f64, py: f64, pz: f64, e: f64) {
        self.set_p4(LorentzVector::new(px, py, pz, e));
    }

    /// Set the three-momentum keeping the current mass shell
    pub fn set_xyz(&mut self, px: f64, py: f64, pz: f64) {
        self.p4 = LorentzVector::from_momentum_mass(Vector3::new(px, py, pz), self.dynamic_mass);
    }

    /// Move onto a new mass shell, keeping the three-momentum
    pub fn set_mass(&mut self, mass: f64) {
        self.dynamic_mass = mass;
        self.p4.set_mass_keep_momentum(mass);
    }

    pub fn lock_mass(&mut self) {
        self.mass_locked = true;
    }

    pub fn unlock_mass(&mut self) {
        self.mass_locked = false;
    }

    pub fn is_mass_locked(&self) -> bool {
        self.mass_locked
    }

    /// Allocate SDME storage if the particle declares the capability.
    pub fn init_sdme(&mut self, alpha_max: usize) -> Option<&mut SpinDensityMatrix> {
        let spin = self.sdme_spin?;
        let rho = self
            .sdme
            .get_or_insert_with(|| SpinDensityMatrix::new(spin, alpha_max));
        Some(rho)
    }

    pub fn sdme(&self) -> Option<&SpinDensityMatrix> {
        self.sdme.as_ref()
    }

    pub fn sdme_mut(&mut self) -> Option<&mut SpinDensityMatrix> {
        self.sdme.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_construction() {
        let p = Particle::new(2212, 0.938272);
        assert_eq!(p.mass(), 0.938272);
        assert_eq!(p.p4().e, 0.938272);
        assert!(p.is_baryon());
        assert!(!p.is_mass_locked());
    }

    #[test]
    fn test_baryon_classification() {
        assert!(is_baryon(2212));
        assert!(is_baryon(-3122));
        assert!(is_baryon(2224));
        assert!(!is_baryon(111));
        assert!(!is_baryon(-211));
        assert!(!is_baryon(223));
        assert!(!is_baryon(22));
        assert!(!is_baryon(1000010020));
    }

    #[test]
    fn test_set_xyzt_mass_round_trip() {
        let mut p = Particle::new(113, 0.775);
        let (px, py, pz) = (0.1, -0.2, 1.3);
        let m: f64 = 0.62;
        let e = (px * px + py * py + pz * pz + m * m).sqrt();
        p.set_xyzt(px, py, pz, e);
        assert!((p.mass() - m).abs() < 1e-12);
        assert!((p.p4().mass() - m).abs() < 1e-12);
    }

    #[test]
    fn test_set_xyz_keeps_mass() {
        let mut p = Particle::new(111, 0.135);
        p.set_xyz(0.3, 0.4, 0.0);
        assert!((p.p4().mass() - 0.135).abs() < 1e-12);
        assert!((p.p4().p_mag() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sdme_requires_capability() {
        let mut pion = Particle::new(111, 0.135);
        assert!(pion.init_sdme(4).is_none());

        let mut rho = Particle::new(113, 0.775).with_sdme_spin(1);
        let sdme = rho.init_sdme(4).unwrap();
        assert_eq!(sdme.spin(), 1);
        assert_eq!(sdme.alpha_max(), 4);
        assert!(rho.sdme().is_some());
    }
}
