//! Two-body reaction kinematics for gamma(*) + N -> meson + baryon.
//!
//! Masses are labelled as in the usual 1 + 2 -> 3 + 4 convention: the (possibly
//! virtual) photon is particle 1, the target 2, the meson 3 and the baryon 4.
//! All functions return NaN rather than panic when evaluated below threshold;
//! callers treat NaN as a kinematically forbidden point.

use crate::lorentz::LorentzVector;

/// Källén triangle function
pub fn kallen(a: f64, b: f64, c: f64) -> f64 {
    a * a + b * b + c * c - 2.0 * (a * b + a * c + b * c)
}

/// Squared breakup momentum of a system of mass `w` into masses `m1`, `m2`
pub fn breakup_momentum_sq(w: f64, m1: f64, m2: f64) -> f64 {
    let w2 = w * w;
    (w2 - (m1 + m2) * (m1 + m2)) * (w2 - (m1 - m2) * (m1 - m2)) / (4.0 * w2)
}

/// Breakup momentum (NaN below threshold)
pub fn breakup_momentum(w: f64, m1: f64, m2: f64) -> f64 {
    breakup_momentum_sq(w, m1, m2).sqrt()
}

/// Squared photon momentum in the photon-target centre-of-mass frame for a
/// photon of virtuality `q2` (negative for space-like photons).
pub fn pgamma_cm_sq(w: f64, q2: f64, target_mass: f64) -> f64 {
    let s = w * w;
    kallen(s, q2, target_mass * target_mass) / (4.0 * s)
}

fn cm_energy(w: f64, ma: f64, mb: f64) -> f64 {
    (w * w + ma * ma - mb * mb) / (2.0 * w)
}

/// Momentum transfer t = (p1 - p3)^2 at centre-of-mass polar angle cos(theta)
pub fn t_from_costh_w(costh: f64, w: f64, m1: f64, m2: f64, m3: f64, m4: f64) -> f64 {
    let e1 = cm_energy(w, m1, m2);
    let e3 = cm_energy(w, m3, m4);
    let p1 = breakup_momentum(w, m1, m2);
    let p3 = breakup_momentum(w, m3, m4);
    m1 * m1 + m3 * m3 - 2.0 * (e1 * e3 - p1 * p3 * costh)
}

/// Inverse of [`t_from_costh_w`]
pub fn costh_from_t_w(t: f64, w: f64, m1: f64, m2: f64, m3: f64, m4: f64) -> f64 {
    let e1 = cm_energy(w, m1, m2);
    let e3 = cm_energy(w, m3, m4);
    let p1 = breakup_momentum(w, m1, m2);
    let p3 = breakup_momentum(w, m3, m4);
    (t - m1 * m1 - m3 * m3 + 2.0 * e1 * e3) / (2.0 * p1 * p3)
}

/// Largest (least negative) kinematically allowed t, at cos(theta) = 1
pub fn t0(w: f64, m1: f64, m2: f64, m3: f64, m4: f64) -> f64 {
    t_from_costh_w(1.0, w, m1, m2, m3, m4)
}

/// Most negative kinematically allowed t, at cos(theta) = -1
pub fn tmax(w: f64, m1: f64, m2: f64, m3: f64, m4: f64) -> f64 {
    t_from_costh_w(-1.0, w, m1, m2, m3, m4)
}

/// Polar and azimuthal angles of a daughter in a decay frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayAngles {
    pub cos_theta: f64,
    pub phi: f64,
}

/// Angles of `daughter` in the rest frame of `parent` with the z axis along
/// the virtual photon and the y axis normal to the lepton scattering plane.
pub fn electro_cm_decay(
    parent: &LorentzVector,
    beam: &LorentzVector,
    photon: &LorentzVector,
    daughter: &LorentzVector,
) -> DecayAngles {
    let beam_cm = beam.to_rest_frame_of(parent).momentum();
    let photon_cm = photon.to_rest_frame_of(parent).momentum();
    let daughter_cm = daughter.to_rest_frame_of(parent).momentum();

    let z = photon_cm.normalize();
    // k x k' with k' = k - q reduces to q x k
    let y = photon_cm.cross(&beam_cm).normalize();
    let x = y.cross(&z);

    let mag = daughter_cm.norm();
    let cos_theta = if mag > 0.0 { daughter_cm.dot(&z) / mag } else { 1.0 };
    DecayAngles {
        cos_theta,
        phi: daughter_cm.dot(&y).atan2(daughter_cm.dot(&x)),
    }
}

/// Masses and energy range defining a two-body channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelMasses {
    /// Photon mass used for the kinematic boundaries (0 for a real photon)
    pub photon: f64,
    pub target: f64,
    pub meson: f64,
    pub baryon: f64,
    pub w_min: f64,
    pub w_max: f64,
}

impl ChannelMasses {
    /// Meson + baryon mass sum
    pub fn threshold(&self) -> f64 {
        self.meson + self.baryon
    }

    pub fn t0(&self, w: f64) -> f64 {
        t0(w, self.photon, self.target, self.meson, self.baryon)
    }

    pub fn tmax(&self, w: f64) -> f64 {
        tmax(w, self.photon, self.target, self.meson, self.baryon)
    }

    pub fn t_from_costh(&self, costh: f64, w: f64) -> f64 {
        t_from_costh_w(costh, w, self.photon, self.target, self.meson, self.baryon)
    }

    /// Width of the allowed t interval for a real photon: 4 * p_gamma * q,
    /// which equals t0 - tmax.
    pub fn dt(&self, w: f64) -> f64 {
        4.0 * pgamma_cm_sq(w, 0.0, self.target).sqrt() * breakup_momentum(w, self.meson, self.baryon)
    }

    pub fn with_meson_mass(&self, meson: f64) -> Self {
        Self { meson, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const MPI0: f64 = 0.135;
    const MP: f64 = 0.938;

    #[test]
    fn test_breakup_momentum_vanishes_at_threshold() {
        assert!(breakup_momentum(MPI0 + MP + 1e-12, MPI0, MP) < 1e-5);
        assert!(breakup_momentum(1.0, MPI0, MP).is_nan());
    }

    #[test]
    fn test_breakup_momentum_known_value() {
        // Massless daughters share W/2 each
        assert!((breakup_momentum(2.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((breakup_momentum_sq(2.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_real_photon_momentum_matches_breakup() {
        let w = 2.3;
        let a = pgamma_cm_sq(w, 0.0, MP);
        let b = breakup_momentum_sq(w, 0.0, MP);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_virtual_photon_momentum_is_larger() {
        let w = 2.3;
        assert!(pgamma_cm_sq(w, -1.0, MP) > pgamma_cm_sq(w, 0.0, MP));
    }

    #[test]
    fn test_t_boundaries_ordering() {
        let w = 1.5;
        let t_zero = t0(w, 0.0, MP, MPI0, MP);
        let t_max = tmax(w, 0.0, MP, MPI0, MP);
        assert!(t_zero <= 0.0);
        assert!(t_max < t_zero);
        let mid = t_from_costh_w(0.0, w, 0.0, MP, MPI0, MP);
        assert!(mid < t_zero && mid > t_max);
    }

    #[test]
    fn test_costh_t_inverse() {
        let w = 2.1;
        for &c in &[-0.9, -0.1, 0.3, 0.99] {
            let t = t_from_costh_w(c, w, 0.0, MP, 0.775, MP);
            let back = costh_from_t_w(t, w, 0.0, MP, 0.775, MP);
            assert!((back - c).abs() < 1e-10);
        }
    }

    #[test]
    fn test_t_matches_four_vector_calculation() {
        // Build explicit CM four-vectors and compare (p1 - p3)^2
        let w: f64 = 1.8;
        let p1 = breakup_momentum(w, 0.0, MP);
        let p3 = breakup_momentum(w, MPI0, MP);
        let costh: f64 = 0.4;
        let sinth = (1.0 - costh * costh).sqrt();
        let photon = LorentzVector::from_momentum_mass(Vector3::new(0.0, 0.0, p1), 0.0);
        let meson =
            LorentzVector::from_momentum_mass(Vector3::new(p3 * sinth, 0.0, p3 * costh), MPI0);
        let expected = (photon - meson).m2();
        let t = t_from_costh_w(costh, w, 0.0, MP, MPI0, MP);
        assert!((t - expected).abs() < 1e-12);
    }

    #[test]
    fn test_dt_equals_t_range() {
        let masses = ChannelMasses {
            photon: 0.0,
            target: MP,
            meson: MPI0,
            baryon: MP,
            w_min: MPI0 + MP,
            w_max: 3.0,
        };
        let w = 1.5;
        let range = masses.t0(w) - masses.tmax(w);
        assert!((masses.dt(w) - range).abs() < 1e-12);
    }

    #[test]
    fn test_electro_decay_axes() {
        // Parent at rest, photon along +z, beam in the x-z plane
        let parent = LorentzVector::at_rest(2.0);
        let photon = LorentzVector::new(0.0, 0.0, 1.0, 0.5);
        let beam = LorentzVector::new(1.0, 0.0, 3.0, 10f64.sqrt());
        let along_y = LorentzVector::from_momentum_mass(Vector3::new(0.0, 0.3, 0.0), MPI0);
        let angles = electro_cm_decay(&parent, &beam, &photon, &along_y);
        assert!((angles.phi.abs() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(angles.cos_theta.abs() < 1e-12);

        let along_z = LorentzVector::from_momentum_mass(Vector3::new(0.0, 0.0, 0.3), MPI0);
        let angles = electro_cm_decay(&parent, &beam, &photon, &along_z);
        assert!((angles.cos_theta - 1.0).abs() < 1e-12);
    }
}
