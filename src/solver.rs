/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Contribution vector via the virtual central bank transform and power iteration.
//!
//! Given a row-stochastic evaluation matrix `E`, each member's contribution is
//! the weight the community's evaluations route to them at equilibrium: the
//! dominant left eigenvector of `E′`, rescaled so the contributions sum to `N`.
//!
//! # Algorithm
//!
//! **Step 1, virtual central bank:** `E′ = E − B + (B·D)/(N−1)` where
//! `B = diag(E[i][i])` and `D = 1 − I`. Each member's self-budget is handed out
//! uniformly to the other `N−1` members, so self-loops cannot inflate anyone's
//! standing. For `N ≤ 1` the matrix is used unchanged.
//!
//! **Step 2, power iteration:** `c₀ = 1`, `c_{k+1} = (E′ᵗ c_k) / ‖E′ᵗ c_k‖₁`,
//! until `‖c_{k+1} − c_k‖₁ < tolerance` or `max_iterations` is reached. A zero
//! image stops the iteration and the zero vector is returned.
//!
//! **Step 3, economic rescaling:** `c ← c · N / Σc` (average contribution 1).
//! A zero sum is returned unscaled.
//!
//! # Invariants
//! - Deterministic: no randomness, fixed starting vector.
//! - For row-stochastic input, `Σc = N` within `1e-6` and every `c[i] ≥ 0`.
//! - Bounded work: at most `max_iterations` matrix-vector products.

use crate::matrix::Matrix;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 500;

/// Default L1 convergence tolerance between successive iterates.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Result of a contribution solve.
#[derive(Clone, Debug, PartialEq)]
pub struct Contributions {
    /// Contribution per member in matrix index order. Sums to `N` unless degenerate.
    pub values: Vec<f64>,
    /// Number of power-iteration steps performed.
    pub iterations: u32,
    /// Whether the tolerance was met within the iteration cap.
    pub converged: bool,
    /// L1 distance between the last two iterates.
    pub residual: f64,
}

impl Contributions {
    /// Contribution of the member at `index`.
    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Sum of all contributions.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Power-iteration solver for the contribution vector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContributionSolver {
    /// Maximum number of power-iteration steps (default 500).
    pub max_iterations: u32,
    /// Stop when the L1 change between iterates falls below this (default 1e-9).
    pub tolerance: f64,
}

impl Default for ContributionSolver {
    fn default() -> Self {
        Self { max_iterations: DEFAULT_MAX_ITERATIONS, tolerance: DEFAULT_TOLERANCE }
    }
}

impl ContributionSolver {
    /// Create a solver with the given iteration cap and tolerance.
    pub fn new(max_iterations: u32, tolerance: f64) -> Self {
        Self { max_iterations, tolerance }
    }

    /// Reject a zero iteration cap or a non-positive tolerance.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_iterations == 0 {
            return Err(crate::PicsyError::OutOfRange { parameter: "max_iterations", value: 0.0 });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(crate::PicsyError::OutOfRange { parameter: "tolerance", value: self.tolerance });
        }
        Ok(())
    }

    /// Compute the contribution vector of `e`.
    pub fn solve(&self, e: &Matrix) -> Contributions {
        let n = e.dim();
        if n == 0 {
            return Contributions { values: Vec::new(), iterations: 0, converged: true, residual: 0.0 };
        }

        let e_prime = vcb_transform(e);
        let mut c = vec![1.0_f64; n];
        let mut iterations = 0;
        let mut converged = false;
        let mut residual = f64::INFINITY;

        while iterations < self.max_iterations {
            iterations += 1;
            let mut next = e_prime.transpose_mul(&c);
            let norm: f64 = next.iter().map(|x| x.abs()).sum();
            if norm == 0.0 {
                tracing::debug!(iterations, "contribution iterate collapsed to zero");
                return Contributions { values: next, iterations, converged: false, residual: 0.0 };
            }
            for x in next.iter_mut() {
                *x /= norm;
            }
            residual = next.iter().zip(&c).map(|(a, b)| (a - b).abs()).sum();
            c = next;
            if residual < self.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            tracing::debug!(n, iterations, residual, "contribution solve converged");
        } else {
            tracing::warn!(
                n,
                iterations,
                residual,
                "contribution solve hit the iteration cap without converging"
            );
        }

        let sum: f64 = c.iter().sum();
        if sum != 0.0 {
            let scale = n as f64 / sum;
            for x in c.iter_mut() {
                *x *= scale;
            }
        }

        Contributions { values: c, iterations, converged, residual }
    }
}

/// `E′ = E − B + (B·D)/(N−1)`: move every self-budget uniformly onto the other members.
///
/// Returns a copy of `e` unchanged when `N ≤ 1`.
pub fn vcb_transform(e: &Matrix) -> Matrix {
    let n = e.dim();
    let mut out = e.clone();
    if n <= 1 {
        return out;
    }
    let share = 1.0 / (n as f64 - 1.0);
    for i in 0..n {
        let budget = e[(i, i)];
        let row = out.row_mut(i);
        for (j, x) in row.iter_mut().enumerate() {
            if j == i {
                *x = 0.0;
            } else {
                *x += budget * share;
            }
        }
    }
    out
}

/// Purchasing power per member: `E[i][i] · c[i]`.
pub fn purchasing_power(e: &Matrix, contributions: &[f64]) -> Vec<f64> {
    e.diagonal()
        .iter()
        .zip(contributions)
        .map(|(budget, c)| budget * c)
        .collect()
}
