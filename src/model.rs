//! Differential cross-section models for gamma(*) + N -> meson + baryon.
//!
//! A model supplies the t-channel squared matrix element; the phase-space
//! factors and dsigma/dt follow from it unless the model overrides them.
//! Models are evaluated with `&self` and carry no per-event state, so one
//! model can serve several threads.

use std::f64::consts::PI;

use crate::kinematics::{breakup_momentum, pgamma_cm_sq};
use crate::sdme::SpinDensityMatrix;

/// Kinematics of one (s, t) evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StKinematics {
    pub w: f64,
    pub s: f64,
    pub t: f64,
    /// Width of the t interval, 4 * p_gamma * q
    pub dt: f64,
    /// Squared photon momentum in the centre-of-mass frame
    pub pgamma_sq: f64,
    /// Meson momentum in the centre-of-mass frame
    pub q: f64,
    /// Photon virtuality Q^2 (0 for real photons)
    pub q2: f64,
    pub target_mass: f64,
    pub meson_mass: f64,
    pub baryon_mass: f64,
}

impl StKinematics {
    pub fn new(w: f64, t: f64, q2: f64, target_mass: f64, meson_mass: f64, baryon_mass: f64) -> Self {
        let pgamma_sq = pgamma_cm_sq(w, -q2, target_mass);
        let q = breakup_momentum(w, meson_mass, baryon_mass);
        Self {
            w,
            s: w * w,
            t,
            dt: 4.0 * pgamma_sq.sqrt() * q,
            pgamma_sq,
            q,
            q2,
            target_mass,
            meson_mass,
            baryon_mass,
        }
    }
}

/// Differential cross-section capability of a two-body channel.
pub trait CrossSectionModel: Send + Sync {
    fn name(&self) -> &str;

    /// |M|^2 for the t-channel configuration in `kin`
    fn matrix_elements_squared_t(&self, kin: &StKinematics) -> f64;

    /// dsigma/dt = |M|^2 / (64 pi s p_gamma^2)
    fn phase_space_factor(&self, kin: &StKinematics) -> f64 {
        1.0 / (64.0 * PI * kin.s * kin.pgamma_sq)
    }

    /// dsigma/dcos(theta) = |M|^2 q / (32 pi s p_gamma)
    fn phase_space_factor_costh(&self, kin: &StKinematics) -> f64 {
        kin.q / (32.0 * PI * kin.s * kin.pgamma_sq.sqrt())
    }

    fn differential_xsect(&self, kin: &StKinematics) -> f64 {
        self.matrix_elements_squared_t(kin) * self.phase_space_factor(kin)
    }

    /// Fill meson spin-density-matrix elements for `kin`
    fn meson_sdmes(&self, _kin: &StKinematics, _rho: &mut SpinDensityMatrix) {}

    /// Fill baryon spin-density-matrix elements for `kin`
    fn baryon_sdmes(&self, _kin: &StKinematics, _rho: &mut SpinDensityMatrix) {}
}

/// dsigma/dt independent of s and t
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDsigmaDt {
    pub value: f64,
}

impl ConstantDsigmaDt {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl CrossSectionModel for ConstantDsigmaDt {
    fn name(&self) -> &str {
        "constant"
    }

    fn matrix_elements_squared_t(&self, kin: &StKinematics) -> f64 {
        self.value / self.phase_space_factor(kin)
    }

    fn differential_xsect(&self, _kin: &StKinematics) -> f64 {
        self.value
    }
}

/// Diffractive dsigma/dt = A exp(b t)
///
/// Vector-meson SDMEs are filled in the s-channel helicity conserving limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialT {
    pub amplitude: f64,
    pub slope: f64,
}

impl ExponentialT {
    pub fn new(amplitude: f64, slope: f64) -> Self {
        Self { amplitude, slope }
    }
}

impl CrossSectionModel for ExponentialT {
    fn name(&self) -> &str {
        "exponential-t"
    }

    fn matrix_elements_squared_t(&self, kin: &StKinematics) -> f64 {
        self.differential_xsect(kin) / self.phase_space_factor(kin)
    }

    fn differential_xsect(&self, kin: &StKinematics) -> f64 {
        self.amplitude * (self.slope * kin.t).exp()
    }

    fn meson_sdmes(&self, _kin: &StKinematics, rho: &mut SpinDensityMatrix) {
        if rho.spin() != 1 {
            return;
        }
        rho.clear();
        rho.set_element(0, 1, 1, 0.5);
        rho.set_element(0, -1, -1, 0.5);
        rho.set_element(1, 1, -1, 0.5);
        rho.set_element(1, -1, 1, 0.5);
    }
}
