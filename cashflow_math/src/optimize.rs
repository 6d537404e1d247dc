//! Derivative-free minimisation
//!
//! A bounded Nelder-Mead simplex search. Objective values that are NaN or
//! infinite are treated as `+inf`, so an objective can reject a region of the
//! parameter space by returning a non-finite value.

use crate::{MathError, Result};
use std::cmp::Ordering;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Outcome of a minimisation run
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Number of simplex iterations performed
    pub iterations: usize,
    /// Whether the simplex collapsed below the tolerance before the iteration cap
    pub converged: bool,
}

/// Nelder-Mead simplex minimiser
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: usize,
    tolerance: f64,
    initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-8,
            initial_step: 0.5,
        }
    }
}

impl NelderMead {
    /// Create a minimiser with the given iteration cap
    pub fn new(max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(MathError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_iterations,
            ..Self::default()
        })
    }

    /// Set the relative spread of objective values treated as converged
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the edge length of the initial simplex
    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Minimise `objective` starting from `start`.
    ///
    /// A zero-dimensional start is evaluated once and returned as converged.
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let evaluate = |x: &[f64]| {
            let value = objective(x);
            if value.is_finite() {
                value
            } else {
                f64::INFINITY
            }
        };

        let n = start.len();
        if n == 0 {
            return Ok(Minimum {
                point: Vec::new(),
                value: evaluate(start),
                iterations: 0,
                converged: true,
            });
        }

        if start.iter().any(|x| !x.is_finite()) {
            return Err(MathError::InvalidInput(
                "Starting point must be finite".to_string(),
            ));
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), evaluate(start)));
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += self.initial_step;
            let value = evaluate(&vertex);
            simplex.push((vertex, value));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            let best = simplex[0].1;
            let worst = simplex[n].1;
            if (worst - best).abs() <= self.tolerance * (1.0 + best.abs()) {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
                .collect();
            let toward = |target: &[f64], coefficient: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(target)
                    .map(|(c, t)| c + coefficient * (t - c))
                    .collect()
            };

            let reflected = toward(&simplex[n].0, -REFLECTION);
            let reflected_value = evaluate(&reflected);

            if reflected_value < best {
                let expanded = toward(&reflected, EXPANSION);
                let expanded_value = evaluate(&expanded);
                simplex[n] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }

            if reflected_value < simplex[n - 1].1 {
                simplex[n] = (reflected, reflected_value);
                continue;
            }

            let (contracted, contracted_value) = if reflected_value < worst {
                let point = toward(&reflected, CONTRACTION);
                let value = evaluate(&point);
                (point, value)
            } else {
                let point = toward(&simplex[n].0, CONTRACTION);
                let value = evaluate(&point);
                (point, value)
            };

            if contracted_value < reflected_value.min(worst) {
                simplex[n] = (contracted, contracted_value);
                continue;
            }

            // Shrink every vertex toward the best one
            let anchor = simplex[0].0.clone();
            for (vertex, value) in simplex.iter_mut().skip(1) {
                for (x, a) in vertex.iter_mut().zip(&anchor) {
                    *x = a + SHRINK * (*x - a);
                }
                *value = evaluate(vertex);
            }
        }

        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        let (point, value) = simplex.swap_remove(0);

        Ok(Minimum {
            point,
            value,
            iterations,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quadratic_bowl() {
        let optimizer = NelderMead::new(500).unwrap();
        let result = optimizer
            .minimize(|x| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2), &[0.0, 0.0])
            .unwrap();

        assert!(result.converged);
        assert_abs_diff_eq!(result.point[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.point[1], -2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let optimizer = NelderMead::new(5).unwrap();
        let result = optimizer
            .minimize(|x| (x[0] - 100.0).powi(2), &[0.0])
            .unwrap();

        assert!(result.iterations <= 5);
        assert!(!result.converged);
    }

    #[test]
    fn test_non_finite_region_is_avoided() {
        let optimizer = NelderMead::new(200).unwrap();
        let result = optimizer
            .minimize(
                |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.5).powi(2) },
                &[0.1],
            )
            .unwrap();

        assert!(result.value.is_finite());
        assert_abs_diff_eq!(result.point[0], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_dimensional_problem() {
        let optimizer = NelderMead::default();
        let result = optimizer.minimize(|_| 3.0, &[]).unwrap();
        assert_eq!(result.value, 3.0);
        assert_eq!(result.iterations, 0);
        assert!(result.converged);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(NelderMead::new(0).is_err());
        assert!(NelderMead::default().minimize(|x| x[0], &[f64::NAN]).is_err());
    }
}
