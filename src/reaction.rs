// Production context shared by the channels of one reaction configuration

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::lorentz::LorentzVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionKind {
    /// Real photon beam
    Photoproduction,
    /// Virtual photon radiated by a scattered lepton
    Electroproduction,
}

/// Linear polarisation of the (virtual) photon
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhotonPolarisation {
    /// Azimuth of the polarisation plane
    pub phi: f64,
}

/// Beam, target and photon state for a production reaction.
///
/// Channels only mutate the photon polarisation azimuth during weight
/// evaluation; everything else is set by the event driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionContext {
    kind: ReactionKind,
    target: LorentzVector,
    beam: LorentzVector,
    photon: LorentzVector,
    pub polarisation: PhotonPolarisation,
    w_max: f64,
    s_weight: f64,
}

impl ProductionContext {
    /// Real photon of energy `beam_energy` along +z on a target at rest
    pub fn photoproduction(beam_energy: f64, target_mass: f64) -> Self {
        let beam = LorentzVector::new(0.0, 0.0, beam_energy, beam_energy);
        let target = LorentzVector::at_rest(target_mass);
        Self {
            kind: ReactionKind::Photoproduction,
            target,
            beam,
            photon: beam,
            polarisation: PhotonPolarisation::default(),
            w_max: (beam + target).mass(),
            s_weight: 1.0,
        }
    }

    /// Lepton of energy `beam_energy` and mass `lepton_mass` along +z on a
    /// target at rest. The photon is set per event from the scattered lepton.
    pub fn electroproduction(beam_energy: f64, lepton_mass: f64, target_mass: f64) -> Self {
        let pz = (beam_energy * beam_energy - lepton_mass * lepton_mass).max(0.0).sqrt();
        let beam = LorentzVector::from_momentum_mass(Vector3::new(0.0, 0.0, pz), lepton_mass);
        let target = LorentzVector::at_rest(target_mass);
        Self {
            kind: ReactionKind::Electroproduction,
            target,
            beam,
            photon: LorentzVector::default(),
            polarisation: PhotonPolarisation::default(),
            w_max: (beam + target).mass() - lepton_mass,
            s_weight: 1.0,
        }
    }

    pub fn kind(&self) -> ReactionKind {
        self.kind
    }

    pub fn is_electroproduction(&self) -> bool {
        self.kind == ReactionKind::Electroproduction
    }

    pub fn target(&self) -> &LorentzVector {
        &self.target
    }

    pub fn beam(&self) -> &LorentzVector {
        &self.beam
    }

    pub fn photon(&self) -> &LorentzVector {
        &self.photon
    }

    pub fn set_target(&mut self, target: LorentzVector) {
        self.target = target;
    }

    pub fn set_beam(&mut self, beam: LorentzVector) {
        self.beam = beam;
        if self.kind == ReactionKind::Photoproduction {
            self.photon = beam;
        }
    }

    pub fn set_photon(&mut self, photon: LorentzVector) {
        self.photon = photon;
    }

    /// Photon = beam - scattered lepton
    pub fn set_scattered_lepton(&mut self, lepton: &LorentzVector) {
        self.photon = self.beam - *lepton;
    }

    /// Photon virtuality Q^2 = -q^2
    pub fn q2(&self) -> f64 {
        -self.photon.m2()
    }

    /// Largest centre-of-mass energy a channel may reach
    pub fn w_max(&self) -> f64 {
        self.w_max
    }

    pub fn set_w_max(&mut self, w_max: f64) {
        self.w_max = w_max;
    }

    /// Correction for non-uniform upstream sampling of the parent mass
    pub fn s_weight(&self) -> f64 {
        self.s_weight
    }

    pub fn set_s_weight(&mut self, s_weight: f64) {
        self.s_weight = s_weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photoproduction_w_max() {
        let ctx = ProductionContext::photoproduction(8.5, 0.938272);
        let expected = (0.938272f64 * 0.938272 + 2.0 * 0.938272 * 8.5).sqrt();
        assert!((ctx.w_max() - expected).abs() < 1e-12);
        assert_eq!(ctx.photon(), ctx.beam());
        assert!(!ctx.is_electroproduction());
        assert_eq!(ctx.s_weight(), 1.0);
    }

    #[test]
    fn test_scattered_lepton_defines_photon() {
        let mut ctx = ProductionContext::electroproduction(10.6, 0.000511, 0.938272);
        assert_eq!(ctx.kind(), ReactionKind::Electroproduction);
        let scattered = LorentzVector::from_momentum_mass(Vector3::new(0.8, 0.0, 6.0), 0.000511);
        ctx.set_scattered_lepton(&scattered);
        assert!(ctx.q2() > 0.0);
        let sum = *ctx.photon() + scattered;
        assert!((sum.e - ctx.beam().e).abs() < 1e-12);
    }

    #[test]
    fn test_setters() {
        let mut ctx = ProductionContext::photoproduction(5.0, 0.938);
        ctx.set_w_max(2.5);
        ctx.set_s_weight(0.5);
        ctx.polarisation.phi = 1.0;
        assert_eq!(ctx.w_max(), 2.5);
        assert_eq!(ctx.s_weight(), 0.5);
        assert_eq!(ctx.polarisation.phi, 1.0);
        ctx.set_beam(LorentzVector::new(0.0, 0.0, 3.0, 3.0));
        assert_eq!(ctx.photon().e, 3.0);
    }
}
