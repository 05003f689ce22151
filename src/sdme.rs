// Spin-density-matrix element storage for a decaying product

/// Elements rho^alpha_{lambda lambda'} for a particle of spin `spin`.
///
/// Helicities run over -J..=J. Models fill the elements during weight
/// evaluation; decay code reads them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinDensityMatrix {
    spin: u32,
    alpha_max: usize,
    elements: Vec<f64>,
}

impl SpinDensityMatrix {
    pub fn new(spin: u32, alpha_max: usize) -> Self {
        let dim = (2 * spin + 1) as usize;
        Self {
            spin,
            alpha_max,
            elements: vec![0.0; alpha_max * dim * dim],
        }
    }

    pub fn spin(&self) -> u32 {
        self.spin
    }

    pub fn alpha_max(&self) -> usize {
        self.alpha_max
    }

    fn index(&self, alpha: usize, lambda: i32, lambda_prime: i32) -> Option<usize> {
        let j = self.spin as i32;
        if alpha >= self.alpha_max || lambda.abs() > j || lambda_prime.abs() > j {
            return None;
        }
        let dim = (2 * j + 1) as usize;
        let row = (lambda + j) as usize;
        let col = (lambda_prime + j) as usize;
        Some((alpha * dim + row) * dim + col)
    }

    /// Element value, or None for out-of-range indices
    pub fn element(&self, alpha: usize, lambda: i32, lambda_prime: i32) -> Option<f64> {
        self.index(alpha, lambda, lambda_prime)
            .map(|i| self.elements[i])
    }

    /// Store an element. Returns false (and stores nothing) for out-of-range indices.
    pub fn set_element(&mut self, alpha: usize, lambda: i32, lambda_prime: i32, value: f64) -> bool {
        match self.index(alpha, lambda, lambda_prime) {
            Some(i) => {
                self.elements[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.elements.iter_mut().for_each(|e| *e = 0.0);
    }
}
