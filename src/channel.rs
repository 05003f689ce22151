//! Two-body s/t channel: parent -> meson + baryon produced by gamma(*) N.
//!
//! [`StChannel::setup`] identifies the products, resolves their SDME
//! capabilities and caches the maximum weight. [`StChannel::intensity`] then
//! returns the normalised acceptance weight of each generated event.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::kinematics::{breakup_momentum_sq, electro_cm_decay, ChannelMasses};
use crate::maximum::{find_maximum, MaximumResult};
use crate::minimizer::MinimizerRegistry;
use crate::model::{CrossSectionModel, StKinematics};
use crate::reaction::ProductionContext;
use crate::registry::{ParticleId, ParticleRegistry};

/// Number of photon polarisation components of the SDMEs
pub const PHOTOPRODUCTION_SDME_ALPHAS: usize = 4;

/// Weight of one event and the kinematics it was evaluated at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWeight {
    pub weight: f64,
    /// Polarisation azimuth set on the production context
    pub phi: f64,
    pub kinematics: StKinematics,
}

pub struct StChannel {
    model: Box<dyn CrossSectionModel>,
    parent: ParticleId,
    meson: ParticleId,
    baryon: ParticleId,
    meson_sdme: Option<ParticleId>,
    baryon_sdme: Option<ParticleId>,
    masses: ChannelMasses,
    maximum: MaximumResult,
}

impl StChannel {
    /// Configure the channel and run the maximum search.
    ///
    /// `products` must hold exactly one meson and one baryon, in either order.
    /// Fails if no minimizer backend from `config.minimizer.preferred` is
    /// available.
    pub fn setup(
        model: Box<dyn CrossSectionModel>,
        parent: ParticleId,
        products: [ParticleId; 2],
        registry: &mut ParticleRegistry,
        ctx: &ProductionContext,
        minimizers: &MinimizerRegistry,
        config: &Config,
    ) -> Result<Self> {
        let first_is_baryon = registry.get(products[0])?.is_baryon();
        let second_is_baryon = registry.get(products[1])?.is_baryon();
        let (meson, baryon) = match (first_is_baryon, second_is_baryon) {
            (false, true) => (products[0], products[1]),
            (true, false) => (products[1], products[0]),
            _ => {
                return Err(Error::InvalidChannel(format!(
                    "products {} and {} are not one meson and one baryon",
                    registry.get(products[0])?.pdg,
                    registry.get(products[1])?.pdg
                )))
            }
        };

        {
            let parent_particle = registry.get_mut(parent)?;
            if parent_particle.daughters.is_empty() {
                parent_particle.daughters = vec![meson, baryon];
            }
        }

        let meson_sdme = registry
            .get_mut(meson)?
            .init_sdme(PHOTOPRODUCTION_SDME_ALPHAS)
            .map(|_| meson);
        let baryon_sdme = registry
            .get_mut(baryon)?
            .init_sdme(PHOTOPRODUCTION_SDME_ALPHAS)
            .map(|_| baryon);

        let masses = ChannelMasses {
            photon: 0.0,
            target: ctx.target().mass(),
            meson: registry.get(meson)?.pdg_mass,
            baryon: registry.get(baryon)?.pdg_mass,
            w_min: registry.minimum_mass_possible(parent)?,
            w_max: ctx.w_max(),
        };

        let minimizer = minimizers.create(&config.minimizer.preferred)?;
        info!(
            model = model.name(),
            meson = registry.get(meson)?.pdg,
            baryon = registry.get(baryon)?.pdg,
            w_min = masses.w_min,
            w_max = masses.w_max,
            backend = minimizer.name(),
            "setting up s/t channel"
        );
        let maximum = find_maximum(model.as_ref(), registry, meson, &masses, minimizer.as_ref(), config)?;

        Ok(Self {
            model,
            parent,
            meson,
            baryon,
            meson_sdme,
            baryon_sdme,
            masses,
            maximum,
        })
    }

    pub fn maximum(&self) -> &MaximumResult {
        &self.maximum
    }

    pub fn masses(&self) -> &ChannelMasses {
        &self.masses
    }

    pub fn model(&self) -> &dyn CrossSectionModel {
        self.model.as_ref()
    }

    pub fn parent(&self) -> ParticleId {
        self.parent
    }

    pub fn meson(&self) -> ParticleId {
        self.meson
    }

    pub fn baryon(&self) -> ParticleId {
        self.baryon
    }

    pub fn meson_has_sdme(&self) -> bool {
        self.meson_sdme.is_some()
    }

    pub fn baryon_has_sdme(&self) -> bool {
        self.baryon_sdme.is_some()
    }

    /// Normalised weight of the current event.
    ///
    /// Sets the context's polarisation azimuth and fills the products' SDMEs
    /// as side effects. Below threshold the weight is exactly 0. Weights above
    /// 1 are reported but returned unchanged.
    pub fn intensity(&self, ctx: &mut ProductionContext, registry: &mut ParticleRegistry) -> Result<EventWeight> {
        let parent = *registry.get(self.parent)?.p4();
        let meson = *registry.get(self.meson)?.p4();
        let baryon = *registry.get(self.baryon)?.p4();

        let w = parent.mass();
        let t = (meson - *ctx.photon()).m2();
        let (meson_mass, baryon_mass) = (meson.mass(), baryon.mass());
        let target_mass = ctx.target().mass();
        let kinematics = StKinematics::new(w, t, ctx.q2(), target_mass, meson_mass, baryon_mass);

        if !(w >= meson_mass + baryon_mass) {
            return Ok(EventWeight {
                weight: 0.0,
                phi: ctx.polarisation.phi,
                kinematics: StKinematics { dt: 0.0, ..kinematics },
            });
        }

        let phi = if ctx.is_electroproduction() {
            electro_cm_decay(&parent, ctx.beam(), ctx.photon(), &meson).phi
        } else {
            meson.phi()
        };
        if phi.is_nan() {
            warn!(
                w,
                q2 = ctx.q2(),
                "undefined polarisation azimuth, is the photon set?"
            );
            return Ok(EventWeight {
                weight: 0.0,
                phi: ctx.polarisation.phi,
                kinematics,
            });
        }
        ctx.polarisation.phi = phi;

        let mut weight = self.model.differential_xsect(&kinematics) * kinematics.dt;

        if let Some(id) = self.meson_sdme {
            if let Some(rho) = registry.get_mut(id)?.sdme_mut() {
                self.model.meson_sdmes(&kinematics, rho);
            }
        }
        if let Some(id) = self.baryon_sdme {
            if let Some(rho) = registry.get_mut(id)?.sdme_mut() {
                self.model.baryon_sdmes(&kinematics, rho);
            }
        }

        weight /= self.maximum.value;
        if ctx.is_electroproduction() {
            // Maximum assumed a real photon
            weight /= (kinematics.pgamma_sq / breakup_momentum_sq(w, 0.0, target_mass)).sqrt();
        }
        if weight > 1.0 {
            warn!(
                weight,
                max = self.maximum.value,
                meson_mass,
                w,
                t,
                "event weight exceeds channel maximum"
            );
        }

        weight /= ctx.s_weight();
        if weight > 1.0 {
            warn!(
                weight,
                s_weight = ctx.s_weight(),
                q2 = ctx.q2(),
                "s-weight corrected event weight exceeds 1"
            );
        }

        Ok(EventWeight {
            weight: if weight > 0.0 { weight } else { 0.0 },
            phi,
            kinematics,
        })
    }
}
