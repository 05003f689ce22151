//! Derivative-free minimizers behind a common interface.
//!
//! Backends are registered by name in a [`MinimizerRegistry`]; channel setup
//! asks the registry for the first available backend in the configured
//! preference order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};

use crate::config::MinimizerSettings;
use crate::error::{Error, Result};

/// A free parameter of the objective
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub start: f64,
    pub step: f64,
    pub limits: Option<(f64, f64)>,
}

impl Variable {
    pub fn new(name: &str, start: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            start,
            step,
            limits: None,
        }
    }

    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.limits = Some((lower, upper));
        self
    }

    fn effective_step(&self) -> f64 {
        if self.step > 0.0 {
            self.step
        } else {
            0.01 * self.start.abs().max(1.0)
        }
    }
}

/// Best point found by a minimization
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub function_calls: usize,
    pub iterations: usize,
    pub converged: bool,
}

pub trait Minimizer: Send + Sync {
    fn name(&self) -> &str;

    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        variables: &[Variable],
        settings: &MinimizerSettings,
    ) -> Minimum;
}

/// Produces a backend on demand and reports whether it can be used.
pub trait MinimizerFactory: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    fn create(&self) -> Box<dyn Minimizer>;
}

/// Ordered collection of minimizer backends
pub struct MinimizerRegistry {
    factories: Vec<Box<dyn MinimizerFactory>>,
}

impl MinimizerRegistry {
    /// Empty registry; every lookup fails until backends are registered.
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Registry holding the built-in genetic and simplex backends
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GeneticFactory));
        registry.register(Box::new(SimplexFactory));
        registry
    }

    pub fn register(&mut self, factory: Box<dyn MinimizerFactory>) {
        self.factories.push(factory);
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// First available backend named in `preferred`, in that order
    pub fn create(&self, preferred: &[String]) -> Result<Box<dyn Minimizer>> {
        for name in preferred {
            match self
                .factories
                .iter()
                .find(|f| f.name().eq_ignore_ascii_case(name))
            {
                Some(factory) if factory.is_available() => return Ok(factory.create()),
                Some(_) => warn!(backend = %name, "minimizer backend unavailable, trying next"),
                None => warn!(backend = %name, "minimizer backend not registered, trying next"),
            }
        }
        Err(Error::NoMinimizerAvailable {
            requested: preferred.to_vec(),
        })
    }
}

impl Default for MinimizerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// Objective wrapper counting calls; NaN is treated as +infinity
struct Counted<'a> {
    objective: &'a dyn Fn(&[f64]) -> f64,
    calls: usize,
}

impl<'a> Counted<'a> {
    fn new(objective: &'a dyn Fn(&[f64]) -> f64) -> Self {
        Self { objective, calls: 0 }
    }

    fn eval(&mut self, x: &[f64]) -> f64 {
        self.calls += 1;
        let value = (self.objective)(x);
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    }
}

fn hard_bounds(variables: &[Variable]) -> Vec<(f64, f64)> {
    variables
        .iter()
        .map(|v| v.limits.unwrap_or((f64::NEG_INFINITY, f64::INFINITY)))
        .collect()
}

// Finite box for population sampling: limits, or 100 steps around the start
fn search_bounds(variables: &[Variable]) -> Vec<(f64, f64)> {
    variables
        .iter()
        .map(|v| {
            v.limits.unwrap_or_else(|| {
                let half = 100.0 * v.effective_step();
                (v.start - half, v.start + half)
            })
        })
        .collect()
}

fn clamp_point(x: &mut [f64], bounds: &[(f64, f64)]) {
    for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
        *xi = xi.max(lo).min(hi);
    }
}

struct SimplexRun {
    x: Vec<f64>,
    value: f64,
    iterations: usize,
    converged: bool,
}

/// Bounded Nelder-Mead: reflection 1, expansion 2, contraction and shrink 0.5.
fn nelder_mead(
    counted: &mut Counted,
    start: &[f64],
    steps: &[f64],
    bounds: &[(f64, f64)],
    tolerance: f64,
    max_calls: usize,
    max_iterations: usize,
) -> SimplexRun {
    let n = start.len();
    let mut x0 = start.to_vec();
    clamp_point(&mut x0, bounds);

    let mut simplex = vec![x0.clone()];
    for i in 0..n {
        let mut x = x0.clone();
        x[i] = if x0[i] + steps[i] <= bounds[i].1 {
            x0[i] + steps[i]
        } else {
            x0[i] - steps[i]
        };
        clamp_point(&mut x, bounds);
        simplex.push(x);
    }
    let mut values: Vec<f64> = simplex.iter().map(|x| counted.eval(x)).collect();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations && counted.calls < max_calls {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let (best, worst) = (values[0], values[n]);
        if 2.0 * (worst - best).abs() <= tolerance * (best.abs() + worst.abs()) + f64::MIN_POSITIVE {
            converged = true;
            break;
        }

        let mut centroid = vec![0.0; n];
        for x in &simplex[..n] {
            for (c, xi) in centroid.iter_mut().zip(x) {
                *c += xi / n as f64;
            }
        }
        let along = |scale: f64, from: &[f64]| -> Vec<f64> {
            let mut x: Vec<f64> = centroid
                .iter()
                .zip(from)
                .map(|(c, f)| c + scale * (c - f))
                .collect();
            clamp_point(&mut x, bounds);
            x
        };

        let reflected = along(1.0, &simplex[n]);
        let f_reflected = counted.eval(&reflected);

        if f_reflected < values[0] {
            let expanded = along(2.0, &simplex[n]);
            let f_expanded = counted.eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }
        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_limit) = if f_reflected < values[n] {
            (along(0.5, &simplex[n]), f_reflected)
        } else {
            (along(-0.5, &simplex[n]), values[n])
        };
        let f_contracted = counted.eval(&contracted);
        if f_contracted < f_limit {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        for i in 1..=n {
            let shrunk: Vec<f64> = simplex[0]
                .iter()
                .zip(&simplex[i])
                .map(|(b, x)| b + 0.5 * (x - b))
                .collect();
            values[i] = counted.eval(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);
    SimplexRun {
        x: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// Nelder-Mead simplex with restarts from the best point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexMinimizer {
    pub max_restarts: usize,
}

impl Default for SimplexMinimizer {
    fn default() -> Self {
        Self { max_restarts: 2 }
    }
}

impl Minimizer for SimplexMinimizer {
    fn name(&self) -> &str {
        "simplex"
    }

    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        variables: &[Variable],
        settings: &MinimizerSettings,
    ) -> Minimum {
        let mut counted = Counted::new(objective);
        let bounds = hard_bounds(variables);
        let steps: Vec<f64> = variables.iter().map(Variable::effective_step).collect();
        let start: Vec<f64> = variables.iter().map(|v| v.start).collect();

        let mut run = nelder_mead(
            &mut counted,
            &start,
            &steps,
            &bounds,
            settings.tolerance,
            settings.max_function_calls,
            settings.max_iterations,
        );
        let mut iterations = run.iterations;
        for _ in 0..self.max_restarts {
            if counted.calls >= settings.max_function_calls {
                break;
            }
            let restart = nelder_mead(
                &mut counted,
                &run.x,
                &steps,
                &bounds,
                settings.tolerance,
                settings.max_function_calls,
                settings.max_iterations,
            );
            iterations += restart.iterations;
            let improved = run.value - restart.value > settings.tolerance * run.value.abs();
            if restart.value < run.value {
                run = restart;
            }
            if !improved {
                break;
            }
        }

        debug!(calls = counted.calls, iterations, value = run.value, "simplex finished");
        Minimum {
            x: run.x,
            value: run.value,
            function_calls: counted.calls,
            iterations,
            converged: run.converged,
        }
    }
}

/// Real-coded genetic algorithm with a simplex polish of the best individual.
///
/// Tournament selection, simulated binary crossover and Gaussian mutation
/// whose width shrinks over the generations. The two best individuals are
/// carried over unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticMinimizer {
    pub population_size: usize,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    /// SBX distribution index
    pub eta: f64,
    /// Generations without improvement before stopping
    pub stall_generations: usize,
}

impl Default for GeneticMinimizer {
    fn default() -> Self {
        Self {
            population_size: 60,
            crossover_prob: 0.9,
            mutation_prob: 0.3,
            eta: 20.0,
            stall_generations: 30,
        }
    }
}

#[derive(Debug, Clone)]
struct Individual {
    x: Vec<f64>,
    value: f64,
}

impl GeneticMinimizer {
    fn tournament_select<'a, R: Rng>(population: &'a [Individual], rng: &mut R) -> &'a Individual {
        let a = &population[rng.gen_range(0..population.len())];
        let b = &population[rng.gen_range(0..population.len())];
        if a.value <= b.value {
            a
        } else {
            b
        }
    }

    fn sbx_value<R: Rng>(p1: f64, p2: f64, eta: f64, rng: &mut R) -> f64 {
        let u = rng.gen::<f64>();
        let beta = if u < 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
        };
        0.5 * ((1.0 + beta) * p1 + (1.0 - beta) * p2)
    }
}

impl Minimizer for GeneticMinimizer {
    fn name(&self) -> &str {
        "genetic"
    }

    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        variables: &[Variable],
        settings: &MinimizerSettings,
    ) -> Minimum {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut counted = Counted::new(objective);
        let bounds = search_bounds(variables);
        let pop_size = self.population_size.max(4);

        let mut start: Vec<f64> = variables.iter().map(|v| v.start).collect();
        clamp_point(&mut start, &bounds);
        let mut population = vec![Individual {
            value: counted.eval(&start),
            x: start,
        }];
        while population.len() < pop_size {
            let x: Vec<f64> = bounds
                .iter()
                .map(|&(lo, hi)| if hi > lo { rng.gen_range(lo..=hi) } else { lo })
                .collect();
            population.push(Individual {
                value: counted.eval(&x),
                x,
            });
        }

        let generations = settings.max_iterations.max(1);
        let mut best_value = f64::INFINITY;
        let mut stall = 0;
        let mut converged = false;
        let mut generation = 0;
        while generation < generations {
            population.sort_by(|a, b| a.value.total_cmp(&b.value));
            let current = population[0].value;
            let threshold = settings.tolerance * current.abs().max(settings.tolerance);
            if best_value - current > threshold {
                stall = 0;
            } else {
                stall += 1;
            }
            best_value = best_value.min(current);
            if stall >= self.stall_generations {
                converged = true;
                break;
            }
            if counted.calls + pop_size > settings.max_function_calls {
                break;
            }

            let shrink = (1.0 - generation as f64 / generations as f64).max(0.05);
            let mut next: Vec<Individual> = population[..2].to_vec();
            while next.len() < pop_size {
                let p1 = Self::tournament_select(&population, &mut rng);
                let p2 = Self::tournament_select(&population, &mut rng);
                let mut child = p1.x.clone();
                if rng.gen::<f64>() < self.crossover_prob {
                    for (c, (a, b)) in child.iter_mut().zip(p1.x.iter().zip(&p2.x)) {
                        if rng.gen::<bool>() {
                            *c = Self::sbx_value(*a, *b, self.eta, &mut rng);
                        }
                    }
                }
                for (c, &(lo, hi)) in child.iter_mut().zip(&bounds) {
                    if rng.gen::<f64>() < self.mutation_prob {
                        if let Ok(normal) = Normal::new(0.0, 0.1 * (hi - lo) * shrink) {
                            *c += normal.sample(&mut rng);
                        }
                    }
                }
                clamp_point(&mut child, &bounds);
                next.push(Individual {
                    value: counted.eval(&child),
                    x: child,
                });
            }
            population = next;
            generation += 1;
        }

        population.sort_by(|a, b| a.value.total_cmp(&b.value));
        let fittest = population.swap_remove(0);
        debug!(
            generations = generation,
            calls = counted.calls,
            value = fittest.value,
            "genetic search finished"
        );

        let steps: Vec<f64> = variables.iter().map(Variable::effective_step).collect();
        let polish = nelder_mead(
            &mut counted,
            &fittest.x,
            &steps,
            &hard_bounds(variables),
            settings.tolerance,
            settings.max_function_calls,
            settings.max_iterations,
        );
        let (x, value) = if polish.value < fittest.value {
            (polish.x, polish.value)
        } else {
            (fittest.x, fittest.value)
        };

        Minimum {
            x,
            value,
            function_calls: counted.calls,
            iterations: generation + polish.iterations,
            converged: converged || polish.converged,
        }
    }
}

struct GeneticFactory;

impl MinimizerFactory for GeneticFactory {
    fn name(&self) -> &str {
        "genetic"
    }

    fn create(&self) -> Box<dyn Minimizer> {
        Box::new(GeneticMinimizer::default())
    }
}

struct SimplexFactory;

impl MinimizerFactory for SimplexFactory {
    fn name(&self) -> &str {
        "simplex"
    }

    fn create(&self) -> Box<dyn Minimizer> {
        Box::new(SimplexMinimizer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(seed: u64) -> MinimizerSettings {
        MinimizerSettings {
            seed: Some(seed),
            ..MinimizerSettings::default()
        }
    }

    fn bowl(x: &[f64]) -> f64 {
        (x[0] - 1.3).powi(2) + 4.0 * (x[1] + 0.4).powi(2) - 2.0
    }

    #[test]
    fn test_simplex_finds_bowl_minimum() {
        let vars = vec![Variable::new("x", 0.0, 0.1), Variable::new("y", 0.0, 0.1)];
        let min = SimplexMinimizer::default().minimize(&bowl, &vars, &settings(1));
        assert!((min.value + 2.0).abs() < 1e-3);
        assert!((min.x[0] - 1.3).abs() < 0.05);
        assert!((min.x[1] + 0.4).abs() < 0.05);
        assert!(min.converged);
    }

    #[test]
    fn test_genetic_finds_bowl_minimum() {
        let vars = vec![
            Variable::new("x", 0.0, 0.1).with_limits(-5.0, 5.0),
            Variable::new("y", 0.0, 0.1).with_limits(-5.0, 5.0),
        ];
        let min = GeneticMinimizer::default().minimize(&bowl, &vars, &settings(2));
        assert!((min.value + 2.0).abs() < 1e-3);
        assert!((min.x[0] - 1.3).abs() < 0.05);
    }

    #[test]
    fn test_genetic_escapes_local_minimum() {
        // Shallow well at x = -2, deep well at x = 3
        let f = |x: &[f64]| -> f64 {
            -0.5 * (-(x[0] + 2.0).powi(2) * 4.0).exp() - 1.0 * (-(x[0] - 3.0).powi(2) * 4.0).exp()
        };
        let vars = vec![Variable::new("x", -2.0, 0.1).with_limits(-5.0, 5.0)];
        let min = GeneticMinimizer::default().minimize(&f, &vars, &settings(3));
        assert!((min.x[0] - 3.0).abs() < 0.05, "x = {}", min.x[0]);
    }

    #[test]
    fn test_limits_are_respected() {
        let vars = vec![
            Variable::new("x", 0.5, 0.1).with_limits(0.0, 1.0),
            Variable::new("y", 0.0, 0.1).with_limits(-1.0, 1.0),
        ];
        for minimizer in [
            Box::new(SimplexMinimizer::default()) as Box<dyn Minimizer>,
            Box::new(GeneticMinimizer::default()),
        ] {
            let min = minimizer.minimize(&bowl, &vars, &settings(4));
            assert!(min.x[0] <= 1.0 && min.x[0] >= 0.0);
            assert!((min.x[0] - 1.0).abs() < 5e-3, "{}: {:?}", minimizer.name(), min.x);
        }
    }

    #[test]
    fn test_seeded_genetic_is_reproducible() {
        let vars = vec![
            Variable::new("x", 0.0, 0.1).with_limits(-5.0, 5.0),
            Variable::new("y", 0.0, 0.1).with_limits(-5.0, 5.0),
        ];
        let a = GeneticMinimizer::default().minimize(&bowl, &vars, &settings(9));
        let b = GeneticMinimizer::default().minimize(&bowl, &vars, &settings(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_function_call_budget() {
        let vars = vec![Variable::new("x", 0.0, 0.1), Variable::new("y", 0.0, 0.1)];
        let mut s = settings(5);
        s.max_function_calls = 40;
        let min = SimplexMinimizer::default().minimize(&bowl, &vars, &s);
        // One iteration may overshoot by at most n + 1 shrink evaluations
        assert!(min.function_calls <= 40 + 4);
    }

    struct Unavailable;

    impl MinimizerFactory for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }
        fn is_available(&self) -> bool {
            false
        }
        fn create(&self) -> Box<dyn Minimizer> {
            Box::new(SimplexMinimizer::default())
        }
    }

    #[test]
    fn test_registry_falls_back_in_order() {
        let mut registry = MinimizerRegistry::new();
        registry.register(Box::new(Unavailable));
        registry.register(Box::new(SimplexFactory));
        let preferred = vec!["unavailable".to_string(), "genetic".to_string(), "simplex".to_string()];
        let minimizer = registry.create(&preferred).unwrap();
        assert_eq!(minimizer.name(), "simplex");
    }

    #[test]
    fn test_registry_none_available() {
        let mut registry = MinimizerRegistry::new();
        registry.register(Box::new(Unavailable));
        let err = registry.create(&["unavailable".to_string()]).err().unwrap();
        assert!(matches!(err, Error::NoMinimizerAvailable { .. }));
    }

    #[test]
    fn test_default_registry_prefers_genetic() {
        let registry = MinimizerRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["genetic", "simplex"]);
        let minimizer = registry.create(&MinimizerSettings::default().preferred).unwrap();
        assert_eq!(minimizer.name(), "genetic");
    }
}
