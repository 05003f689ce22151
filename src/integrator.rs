// Adaptive Gauss-Kronrod quadrature used by the diagnostic scans

use tracing::debug;

use crate::config::IntegrationSettings;

// 15-point Kronrod abscissae and weights with the embedded 7-point Gauss rule
const XGK: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144845693013,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.000000000000000000000000000000000,
];

const WGK: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

const WG: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

/// Integral estimate with its error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub value: f64,
    pub error: f64,
    pub subdivisions: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

fn gauss_kronrod_15<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> Segment {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let fc = f(center);
    let mut gauss = fc * WG[3];
    let mut kronrod = fc * WGK[7];
    for j in 0..3 {
        let k = 2 * j + 1;
        let dx = half * XGK[k];
        let sum = f(center - dx) + f(center + dx);
        gauss += WG[j] * sum;
        kronrod += WGK[k] * sum;
    }
    for j in 0..4 {
        let k = 2 * j;
        let dx = half * XGK[k];
        kronrod += WGK[k] * (f(center - dx) + f(center + dx));
    }
    Segment {
        a,
        b,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    }
}

/// Integrate `f` over [a, b], bisecting the segment with the largest error
/// until the requested tolerance or the subdivision limit is reached.
pub fn integrate<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, settings: &IntegrationSettings) -> Quadrature {
    if a == b {
        return Quadrature {
            value: 0.0,
            error: 0.0,
            subdivisions: 0,
            converged: true,
        };
    }

    let mut segments = vec![gauss_kronrod_15(&f, a, b)];
    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        let target = settings.abs_tolerance.max(settings.rel_tolerance * value.abs());
        let converged = error <= target;
        if converged || segments.len() > settings.max_subdivisions || !error.is_finite() {
            if !converged {
                debug!(value, error, subdivisions = segments.len(), "quadrature did not converge");
            }
            return Quadrature {
                value,
                error,
                subdivisions: segments.len(),
                converged,
            };
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.a + seg.b);
        segments.push(gauss_kronrod_15(&f, seg.a, mid));
        segments.push(gauss_kronrod_15(&f, mid, seg.b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_sine_integral() {
        let q = integrate(|x: f64| x.sin(), 0.0, PI, &IntegrationSettings::default());
        assert!((q.value - 2.0).abs() < 1e-10);
        assert!(q.converged);
    }

    #[test]
    fn test_polynomial_is_exact() {
        let q = integrate(|x: f64| 3.0 * x * x - x + 1.0, -1.0, 2.0, &IntegrationSettings::default());
        assert!((q.value - 10.5).abs() < 1e-12);
        assert_eq!(q.subdivisions, 1);
    }

    #[test]
    fn test_endpoint_singularity_needs_subdivision() {
        let q = integrate(|x: f64| x.sqrt(), 0.0, 1.0, &IntegrationSettings::default());
        assert!((q.value - 2.0 / 3.0).abs() < 1e-7);
        assert!(q.subdivisions > 1);
    }

    #[test]
    fn test_reversed_and_empty_intervals() {
        let settings = IntegrationSettings::default();
        let q = integrate(|x: f64| x, 1.0, 0.0, &settings);
        assert!((q.value + 0.5).abs() < 1e-12);
        assert_eq!(integrate(|x: f64| x, 1.0, 1.0, &settings).value, 0.0);
    }
}
