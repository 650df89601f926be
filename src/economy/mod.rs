/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Invariant-preserving economic operations on the evaluation matrix.
//!
//! Every operation here is a pure function of a borrowed
//! [`EvaluationState`](crate::state::EvaluationState) and typed parameters. It
//! validates, builds a new matrix from a deep copy, row-normalizes it, and
//! returns it. Nothing is written back; [`crate::community::Community`]
//! commits the result under its lock, so a rejected operation can never leave
//! a partially mutated matrix behind.
//!
//! | Operation | Function | Matrix effect |
//! |-----------|----------|---------------|
//! | Fixed-price transaction | [`settle`] | `E[b][b] −= α`, `E[b][s] += α`, `α = δ / c_b` |
//! | Member addition | [`onboard`] | `N → N+1`, contribution-preserving recipe |
//! | Natural recovery | [`recover`] | non-ghost rows decay toward self-reliance |
//! | Company creation | [`charter`] | `N → N+1`, founder investments + outflows |
//! | Company decomposition | [`decompose`] | people-only matrix, company folded out |

pub mod company;
pub mod onboarding;
pub mod recovery;
pub mod transaction;

pub use company::{charter, decompose, CompanyCharter, Decomposition, Founder, Outflow, MAX_COMPANY_BUDGET};
pub use onboarding::onboard;
pub use recovery::recover;
pub use transaction::{settle, Settlement, Transaction};

/// Default slack allowed when comparing a spend against an available budget.
pub const DEFAULT_BUDGET_EPSILON: f64 = 1e-12;

/// Default lower bound for the `1 − E[x][x]` denominator in decomposition.
pub const DEFAULT_DECOMPOSITION_FLOOR: f64 = 1e-12;

/// Numerical slack used by the economic operations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Tolerances {
    /// A spend may exceed the available budget by at most this much.
    pub budget_epsilon: f64,
    /// Floor for the company self-budget complement during decomposition.
    pub decomposition_floor: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            budget_epsilon: DEFAULT_BUDGET_EPSILON,
            decomposition_floor: DEFAULT_DECOMPOSITION_FLOOR,
        }
    }
}

impl Tolerances {
    /// Both slacks must be finite and positive.
    pub fn validate(&self) -> crate::Result<()> {
        for (parameter, value) in [
            ("budget_epsilon", self.budget_epsilon),
            ("decomposition_floor", self.decomposition_floor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(crate::PicsyError::OutOfRange { parameter, value });
            }
        }
        Ok(())
    }
}

/// Reject non-finite values and values outside `[lo, hi]`.
pub(crate) fn check_range(parameter: &'static str, value: f64, lo: f64, hi: f64) -> crate::Result<()> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(crate::PicsyError::OutOfRange { parameter, value });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::matrix::Matrix;
    use crate::state::EvaluationState;

    /// People over the given rows, ids `1..=n`.
    pub fn state(rows: &[&[f64]]) -> EvaluationState {
        let m = Matrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap();
        EvaluationState::new(None, m).unwrap()
    }

    /// Doubly stochastic with equal diagonals: every contribution is exactly 1.
    pub fn balanced() -> EvaluationState {
        state(&[&[0.4, 0.3, 0.3], &[0.3, 0.4, 0.3], &[0.3, 0.3, 0.4]])
    }

    pub fn assert_row_stochastic(m: &Matrix) {
        for (i, s) in m.row_sums().iter().enumerate() {
            assert!((s - 1.0).abs() < 1e-12, "row {} sum = {}", i, s);
        }
        for row in m.rows() {
            assert!(row.iter().all(|&x| x >= 0.0), "negative entry in {:?}", row);
        }
    }

    pub fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "actual = {:.9}, expected = {:.9}",
            actual,
            expected
        );
    }
}
