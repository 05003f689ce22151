// Weighted-event kinematics for gamma(*) N -> meson baryon channels
pub mod channel;
pub mod config;
pub mod error;
pub mod integrator;
pub mod kinematics;
pub mod lorentz;
pub mod mass_sampling;
pub mod maximum;
pub mod minimizer;
pub mod model;
pub mod particle;
pub mod reaction;
pub mod registry;
pub mod scan;
pub mod sdme;
pub mod stats;

pub use channel::{EventWeight, StChannel};
pub use config::{Config, IntegrationSettings, MinimizerSettings};
pub use error::{Error, Result};
pub use kinematics::ChannelMasses;
pub use lorentz::LorentzVector;
pub use mass_sampling::{determine_dynamic_mass, MassDraw, MassOutcome, MassRange};
pub use maximum::{find_maximum, weight_density, MaximumResult};
pub use minimizer::{
    GeneticMinimizer, Minimizer, MinimizerFactory, MinimizerRegistry, Minimum, SimplexMinimizer,
    Variable,
};
pub use model::{ConstantDsigmaDt, CrossSectionModel, ExponentialT, StKinematics};
pub use particle::Particle;
pub use reaction::{PhotonPolarisation, ProductionContext, ReactionKind};
pub use registry::{ParticleId, ParticleRegistry};
pub use sdme::SpinDensityMatrix;
pub use stats::{MassDistribution, MassSample};
