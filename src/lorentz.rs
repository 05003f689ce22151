// Minimal Lorentz four-vector used by the kinematics and weight code

use nalgebra::Vector3;
use std::ops::{Add, Neg, Sub};

/// Four-momentum (px, py, pz, E) with metric (+,-,-,-).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LorentzVector {
    pub p: Vector3<f64>,
    pub e: f64,
}

impl LorentzVector {
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self {
            p: Vector3::new(px, py, pz),
            e,
        }
    }

    /// Build an on-shell vector from a three-momentum and a mass
    pub fn from_momentum_mass(p: Vector3<f64>, mass: f64) -> Self {
        let e = (p.norm_squared() + mass * mass).sqrt();
        Self { p, e }
    }

    pub fn at_rest(mass: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, mass)
    }

    pub fn px(&self) -> f64 {
        self.p.x
    }
    pub fn py(&self) -> f64 {
        self.p.y
    }
    pub fn pz(&self) -> f64 {
        self.p.z
    }

    pub fn momentum(&self) -> Vector3<f64> {
        self.p
    }

    /// Squared three-momentum
    pub fn p2(&self) -> f64 {
        self.p.norm_squared()
    }

    pub fn p_mag(&self) -> f64 {
        self.p.norm()
    }

    /// Invariant mass squared; negative for space-like vectors.
    pub fn m2(&self) -> f64 {
        self.e * self.e - self.p2()
    }

    /// Invariant mass, returned as -sqrt(-m2) for space-like vectors.
    pub fn mass(&self) -> f64 {
        let m2 = self.m2();
        if m2 >= 0.0 {
            m2.sqrt()
        } else {
            -(-m2).sqrt()
        }
    }

    /// Azimuthal angle of the three-momentum in (-pi, pi].
    pub fn phi(&self) -> f64 {
        if self.p.x == 0.0 && self.p.y == 0.0 {
            0.0
        } else {
            self.p.y.atan2(self.p.x)
        }
    }

    pub fn theta(&self) -> f64 {
        let pt = (self.p.x * self.p.x + self.p.y * self.p.y).sqrt();
        if pt == 0.0 && self.p.z == 0.0 {
            0.0
        } else {
            pt.atan2(self.p.z)
        }
    }

    pub fn cos_theta(&self) -> f64 {
        let mag = self.p_mag();
        if mag == 0.0 {
            1.0
        } else {
            self.p.z / mag
        }
    }

    /// Velocity of the frame in which this vector is at rest
    pub fn boost_vector(&self) -> Vector3<f64> {
        self.p / self.e
    }

    /// Move the vector onto a new mass shell keeping its three-momentum
    pub fn set_mass_keep_momentum(&mut self, mass: f64) {
        self.e = (self.p2() + mass * mass).sqrt();
    }

    /// Lorentz boost by velocity `beta`
    pub fn boost(&self, beta: &Vector3<f64>) -> Self {
        let b2 = beta.norm_squared();
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let bp = beta.dot(&self.p);
        let gamma2 = (gamma - 1.0) / b2;
        Self {
            p: self.p + (gamma2 * bp + gamma * self.e) * beta,
            e: gamma * (self.e + bp),
        }
    }

    /// Boost into the rest frame of `frame`
    pub fn to_rest_frame_of(&self, frame: &LorentzVector) -> Self {
        self.boost(&(-frame.boost_vector()))
    }

    pub fn dot(&self, other: &LorentzVector) -> f64 {
        self.e * other.e - self.p.dot(&other.p)
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;
    fn add(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector {
            p: self.p + rhs.p,
            e: self.e + rhs.e,
        }
    }
}

impl Sub for LorentzVector {
    type Output = LorentzVector;
    fn sub(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector {
            p: self.p - rhs.p,
            e: self.e - rhs.e,
        }
    }
}

impl Neg for LorentzVector {
    type Output = LorentzVector;
    fn neg(self) -> LorentzVector {
        LorentzVector {
            p: -self.p,
            e: -self.e,
        }
    }
}
