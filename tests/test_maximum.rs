// The cached channel maximum bounds the weight density over the physical domain

use photoprod::kinematics::ChannelMasses;
use photoprod::model::StKinematics;
use photoprod::{
    weight_density, Config, CrossSectionModel, ExponentialT, MassDistribution, MinimizerRegistry, Particle,
    ParticleRegistry, ProductionContext, StChannel,
};
use tracing_subscriber::EnvFilter;

const MP: f64 = 0.938272;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Exponential t slope times a Breit-Wigner bump in W
struct ResonantModel {
    w_peak: f64,
    w_width: f64,
    slope: f64,
}

impl CrossSectionModel for ResonantModel {
    fn name(&self) -> &str {
        "resonant"
    }

    fn matrix_elements_squared_t(&self, kin: &StKinematics) -> f64 {
        self.differential_xsect(kin) / self.phase_space_factor(kin)
    }

    fn differential_xsect(&self, kin: &StKinematics) -> f64 {
        let half = 0.5 * self.w_width;
        let bw = half * half / ((kin.w - self.w_peak).powi(2) + half * half);
        bw * (self.slope * kin.t).exp()
    }
}

/// Largest density on a grid of bin centres over the search window
fn grid_max(model: &dyn CrossSectionModel, masses: &ChannelMasses, n: usize) -> f64 {
    let lo = masses.w_min.max(masses.threshold());
    let mut best: f64 = 0.0;
    for i in 0..n {
        let w = lo + (i as f64 + 0.5) * (masses.w_max - lo) / n as f64;
        for j in 0..n {
            let costh = -1.0 + (j as f64 + 0.5) * 2.0 / n as f64;
            best = best.max(weight_density(model, masses, w, costh));
        }
    }
    best
}

fn rho_channel(
    model: Box<dyn CrossSectionModel>,
    beam_energy: f64,
    preferred: &str,
) -> (StChannel, ParticleRegistry, photoprod::ParticleId) {
    let mut registry = ParticleRegistry::new();
    let parent = registry.add(Particle::new(9_000_002, 2.0));
    let dist = MassDistribution::new_breit_wigner(0.775, 0.149, 0.3, 1.2).unwrap();
    let rho = registry.add(Particle::new(113, 0.775).with_mass_distribution(dist));
    let proton = registry.add(Particle::new(2212, MP));
    let ctx = ProductionContext::photoproduction(beam_energy, MP);
    let mut config = Config::new();
    config.minimizer.seed = Some(17);
    config.minimizer.preferred = vec![preferred.to_string()];
    let channel = StChannel::setup(
        model,
        parent,
        [rho, proton],
        &mut registry,
        &ctx,
        &MinimizerRegistry::with_defaults(),
        &config,
    )
    .unwrap();
    (channel, registry, rho)
}

#[test]
fn test_maximum_bounds_grid_for_nominal_and_minimum_mass() {
    init_logging();
    for preferred in ["genetic", "simplex"] {
        let (channel, registry, rho) = rho_channel(Box::new(ExponentialT::new(10.0, 6.0)), 3.0, preferred);
        let max = channel.maximum();
        let nominal = *channel.masses();
        let lowest = nominal.with_meson_mass(0.3);

        let grid_nominal = grid_max(channel.model(), &nominal, 40);
        let grid_lowest = grid_max(channel.model(), &lowest, 40);
        assert!(grid_nominal > 0.0 && grid_lowest > 0.0);
        assert!(grid_nominal <= max.base * 1.001, "{}: {} > {}", preferred, grid_nominal, max.base);
        assert!(grid_lowest <= max.base * 1.001, "{}: {} > {}", preferred, grid_lowest, max.base);
        assert!((max.value - 1.08 * max.base).abs() < 1e-12);

        // Threshold probing leaves the meson untouched
        assert_eq!(registry.get(rho).unwrap().mass(), 0.775);
    }
}

#[test]
fn test_interior_maximum_is_found() {
    init_logging();
    let model = ResonantModel {
        w_peak: 1.9,
        w_width: 0.15,
        slope: 4.0,
    };
    let (channel, _registry, _rho) = rho_channel(Box::new(model), 4.0, "genetic");
    let max = channel.maximum();
    let grid_nominal = grid_max(channel.model(), channel.masses(), 60);
    let grid_lowest = grid_max(channel.model(), &channel.masses().with_meson_mass(0.3), 60);
    let grid = grid_nominal.max(grid_lowest);
    assert!(grid <= max.base * 1.001);
    // The search should not be far below the grid either
    assert!(max.base <= grid * 1.2);
    assert!((max.w - 1.9).abs() < 0.2, "W at maximum {}", max.w);
    assert!(!max.fallback_used);
}

#[test]
fn test_maximum_location_is_physical() {
    let (channel, _registry, _rho) = rho_channel(Box::new(ExponentialT::new(10.0, 6.0)), 3.0, "genetic");
    let max = channel.maximum();
    let masses = if max.threshold_adopted {
        channel.masses().with_meson_mass(0.3)
    } else {
        *channel.masses()
    };
    assert!(max.w >= masses.threshold() && max.w <= masses.w_max);
    assert!(max.t <= masses.t0(max.w) + 1e-9);
    assert!(max.t >= masses.tmax(max.w) - 1e-9);
}
