/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Natural recovery: old evaluations decay back toward self-reliance.
//!
//! For every non-ghost row `i` and rate `γ ∈ [0, 1]`:
//!
//! ```text
//! E[i][j] ← (1 − γ) · E[i][j]          for j ≠ i
//! E[i][i] ← E[i][i] + γ · (1 − E[i][i])
//! ```
//!
//! The row loses `γ · (1 − E[i][i])` off the diagonal and gains exactly that on
//! it. Ghost rows are frozen; their influence fades only as other rows move.

use crate::economy::check_range;
use crate::error::Result;
use crate::matrix::Matrix;
use crate::state::EvaluationState;

/// Apply one recovery step at rate `gamma` and return the normalized matrix.
///
/// `gamma` outside `[0, 1]` is [`crate::PicsyError::OutOfRange`].
pub fn recover(state: &EvaluationState, gamma: f64) -> Result<Matrix> {
    check_range("gamma", gamma, 0.0, 1.0)?;

    let mut e = state.snapshot_matrix();
    for i in 0..e.dim() {
        if state.is_ghost_row(i) {
            continue;
        }
        let row = e.row_mut(i);
        let budget = row[i];
        for (j, x) in row.iter_mut().enumerate() {
            if j != i {
                *x *= 1.0 - gamma;
            }
        }
        row[i] = budget + gamma * (1.0 - budget);
    }

    e.normalize_rows()?;
    Ok(e)
}
