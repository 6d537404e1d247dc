//! Lag polynomials for ARIMA-type models
//!
//! A polynomial `c0 + c1*L + c2*L^2 + ...` in the lag operator `L` is stored
//! by its coefficients in ascending lag order. Autoregressive polynomials are
//! written `1 - phi1*L - ...` and moving-average polynomials `1 + theta1*L + ...`,
//! so a model reads `a(L) y_t = b(L) e_t`.

use std::ops::Mul;

/// Polynomial in the lag operator
#[derive(Debug, Clone, PartialEq)]
pub struct LagPolynomial {
    coefficients: Vec<f64>,
}

impl LagPolynomial {
    /// The identity polynomial `1`
    pub fn one() -> Self {
        Self {
            coefficients: vec![1.0],
        }
    }

    /// Build a polynomial from raw coefficients (lag 0 first)
    pub fn from_coefficients(coefficients: Vec<f64>) -> Self {
        if coefficients.is_empty() {
            return Self::one();
        }
        Self { coefficients }
    }

    /// Autoregressive polynomial `1 - phi1*L^step - phi2*L^(2*step) - ...`
    pub fn autoregressive(phi: &[f64], step: usize) -> Self {
        Self::sparse(phi.iter().map(|c| -c), step)
    }

    /// Moving-average polynomial `1 + theta1*L^step + theta2*L^(2*step) + ...`
    pub fn moving_average(theta: &[f64], step: usize) -> Self {
        Self::sparse(theta.iter().copied(), step)
    }

    /// Differencing polynomial `(1 - L)^d * (1 - L^period)^seasonal_d`
    pub fn differencing(d: usize, seasonal_d: usize, period: usize) -> Self {
        let regular = Self::autoregressive(&[1.0], 1);
        let seasonal = Self::autoregressive(&[1.0], period);

        let mut result = Self::one();
        for _ in 0..d {
            result = &result * &regular;
        }
        for _ in 0..seasonal_d {
            result = &result * &seasonal;
        }
        result
    }

    fn sparse(values: impl Iterator<Item = f64>, step: usize) -> Self {
        let step = step.max(1);
        let mut coefficients = vec![1.0];
        for (i, value) in values.enumerate() {
            let lag = (i + 1) * step;
            coefficients.resize(lag + 1, 0.0);
            coefficients[lag] = value;
        }
        Self { coefficients }
    }

    /// Highest lag carried by the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Coefficients in ascending lag order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Coefficient at `lag`, zero beyond the degree
    pub fn coefficient(&self, lag: usize) -> f64 {
        self.coefficients.get(lag).copied().unwrap_or(0.0)
    }

    /// Product of two polynomials
    pub fn multiply(&self, other: &Self) -> Self {
        let mut coefficients = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            if *a == 0.0 {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                coefficients[i + j] += a * b;
            }
        }
        Self { coefficients }
    }
}

impl Mul for &LagPolynomial {
    type Output = LagPolynomial;

    fn mul(self, rhs: Self) -> LagPolynomial {
        self.multiply(rhs)
    }
}

/// Map unconstrained reals to the coefficients of a stationary AR polynomial.
///
/// Each value is squashed into a partial autocorrelation in `(-1, 1)` and the
/// Durbin-Levinson recursion turns those into `phi1..phin`. Any input yields
/// `1 - phi1*L - ... - phin*L^n` with all roots outside the unit circle. The
/// same map, negated, gives invertible moving-average coefficients.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let partials: Vec<f64> = unconstrained
        .iter()
        .map(|x| x / (1.0 + x * x).sqrt())
        .collect();

    let mut phi: Vec<f64> = Vec::with_capacity(partials.len());
    for (k, &r) in partials.iter().enumerate() {
        let previous = phi.clone();
        for i in 0..k {
            phi[i] = previous[i] - r * previous[k - 1 - i];
        }
        phi.push(r);
    }
    phi
}

/// Check whether `1 - phi1*L - ... - phin*L^n` is stationary.
///
/// Runs the Durbin-Levinson recursion backwards; the polynomial is stationary
/// exactly when every recovered partial autocorrelation lies in `(-1, 1)`.
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut current = phi.to_vec();
    while let Some(&r) = current.last() {
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let k = current.len();
        let denominator = 1.0 - r * r;
        current = (0..k - 1)
            .map(|i| (current[i] + r * current[k - 2 - i]) / denominator)
            .collect();
    }
    true
}

/// First `count` weights of the infinite MA representation `b(L) / a(L)`.
///
/// Forecast error variance at horizon `h` is `sigma2 * sum(psi_j^2, j < h)`.
pub fn psi_weights(ar: &LagPolynomial, ma: &LagPolynomial, count: usize) -> Vec<f64> {
    let mut psi: Vec<f64> = Vec::with_capacity(count);
    let lead = ar.coefficient(0);
    for j in 0..count {
        let feedback: f64 = (1..=j.min(ar.degree()))
            .map(|i| ar.coefficient(i) * psi[j - i])
            .sum();
        psi.push((ma.coefficient(j) - feedback) / lead);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_differencing_polynomial() {
        let poly = LagPolynomial::differencing(1, 1, 4);
        // (1 - L)(1 - L^4) = 1 - L - L^4 + L^5
        assert_eq!(poly.coefficients(), &[1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
        assert_eq!(poly.degree(), 5);

        let identity = LagPolynomial::differencing(0, 0, 12);
        assert_eq!(identity, LagPolynomial::one());
    }

    #[test]
    fn test_seasonal_autoregressive_layout() {
        let poly = LagPolynomial::autoregressive(&[0.5, 0.25], 3);
        assert_eq!(poly.coefficients(), &[1.0, 0.0, 0.0, -0.5, 0.0, 0.0, -0.25]);
        assert_eq!(poly.coefficient(10), 0.0);
    }

    #[test]
    fn test_multiply() {
        let a = LagPolynomial::moving_average(&[0.5], 1);
        let b = LagPolynomial::moving_average(&[0.2], 2);
        let product = &a * &b;
        assert_eq!(product.coefficients(), &[1.0, 0.5, 0.2, 0.1]);
    }

    #[test]
    fn test_constrain_stationary_is_always_stationary() {
        let inputs: [&[f64]; 5] = [
            &[0.0],
            &[50.0],
            &[-3.0, 7.5],
            &[10.0, -10.0, 10.0],
            &[1.2, 0.3, -4.0, 2.2],
        ];
        for input in inputs {
            let phi = constrain_stationary(input);
            assert_eq!(phi.len(), input.len());
            assert!(is_stationary(&phi), "not stationary: {:?}", phi);
        }
    }

    #[test]
    fn test_is_stationary_rejects_unit_root() {
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[0.5, 0.6]));
        assert!(is_stationary(&[0.5, 0.3]));
        assert!(is_stationary(&[]));
    }

    #[test]
    fn test_is_stationary_matches_ar2_triangle() {
        let in_triangle = |a: f64, b: f64| a + b < 1.0 && b - a < 1.0 && b.abs() < 1.0;
        let grid: Vec<f64> = (-8..=8).map(|step| step as f64 * 0.25).collect();
        for &a in &grid {
            for &b in &grid {
                // boundary points are not stationary but sit on float edges
                if (a + b - 1.0).abs() < 1e-9 || (b - a - 1.0).abs() < 1e-9 || (b.abs() - 1.0).abs() < 1e-9 {
                    continue;
                }
                assert_eq!(is_stationary(&[a, b]), in_triangle(a, b), "phi = [{}, {}]", a, b);
            }
        }

        for input in [[-3.0, 7.5], [2.0, 2.0]] {
            let phi = constrain_stationary(&input);
            assert!(in_triangle(phi[0], phi[1]), "phi = {:?}", phi);
            assert!(is_stationary(&phi), "phi = {:?}", phi);
        }
    }

    #[test]
    fn test_psi_weights_ar1() {
        let ar = LagPolynomial::autoregressive(&[0.5], 1);
        let psi = psi_weights(&ar, &LagPolynomial::one(), 4);
        assert_relative_eq!(psi[0], 1.0);
        assert_relative_eq!(psi[1], 0.5);
        assert_relative_eq!(psi[2], 0.25);
        assert_relative_eq!(psi[3], 0.125);
    }

    #[test]
    fn test_psi_weights_random_walk() {
        let ar = LagPolynomial::differencing(1, 0, 12);
        let psi = psi_weights(&ar, &LagPolynomial::one(), 5);
        assert_eq!(psi, vec![1.0; 5]);
    }
}
