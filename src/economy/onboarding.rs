/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Member addition without disturbing existing standing.
//!
//! The matrix grows from `N × N` to `(N+1) × (N+1)`:
//!
//! ```text
//! existing row i:  E[i][i] kept
//!                  E[i][j] · (N−1)/N      for j ≠ i
//!                  new column (1 − E[i][i]) / N
//! new row:         c[j] / N               for j < N
//!                  0                      newcomer holds no self-budget
//! ```
//!
//! Each existing row cedes `1/N` of its outgoing (non-self) evaluation to the
//! newcomer, and the newcomer's row spreads its evaluation in proportion to
//! everyone's current contribution share.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::solver::ContributionSolver;
use crate::state::EvaluationState;

/// Build the expanded, row-normalized matrix for one new member at index `N`.
///
/// The first member of an empty community gets `[[1.0]]`.
pub fn onboard(state: &EvaluationState, solver: &ContributionSolver) -> Result<Matrix> {
    let e = state.matrix();
    let n = e.dim();
    if n == 0 {
        return Ok(Matrix::identity(1));
    }

    let c = solver.solve(e);
    let nf = n as f64;
    let keep = (nf - 1.0) / nf;

    let mut grown = e.grown();
    for i in 0..n {
        let budget = e[(i, i)];
        for (j, x) in grown.row_mut(i)[..n].iter_mut().enumerate() {
            if j != i {
                *x *= keep;
            }
        }
        grown[(i, n)] = (1.0 - budget) / nf;
    }
    for (j, cj) in c.values.iter().enumerate() {
        grown[(n, j)] = cj / nf;
    }
    grown[(n, n)] = 0.0;

    grown.normalize_rows()?;
    Ok(grown)
}
