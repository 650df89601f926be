/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Fixed-price transaction: the buyer spends self-budget on the seller.
//!
//! A price `δ` is market-denominated. The buyer pays it by converting
//! `α = δ / c_b` of its retained self-evaluation into evaluation of the seller,
//! where `c_b` is the buyer's current contribution:
//!
//! ```text
//! E[b][b] −= α
//! E[b][s] += α
//! ```
//!
//! Only row `b` changes, and it loses exactly what it gains, so the row sum
//! stays 1 before the final normalization.

use crate::economy::check_range;
use crate::error::{PicsyError, Result};
use crate::matrix::Matrix;
use crate::member::MemberId;
use crate::solver::ContributionSolver;
use crate::state::EvaluationState;

/// A purchase request.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    /// Paying member.
    pub buyer: MemberId,
    /// Receiving member.
    pub seller: MemberId,
    /// Market price `δ ≥ 0`.
    pub price: f64,
}

/// A validated transaction ready to commit.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    /// The new, row-normalized matrix.
    pub matrix: Matrix,
    /// Evaluation transferred from `E[b][b]` to `E[b][s]`.
    pub alpha: f64,
    /// Buyer contribution the price was converted with.
    pub buyer_contribution: f64,
}

/// Price a transaction against the current state.
///
/// Fails with [`PicsyError::UnknownMember`], [`PicsyError::SelfTransaction`],
/// [`PicsyError::ZeroContribution`], [`PicsyError::NegativeTransfer`] or
/// [`PicsyError::InsufficientBudget`]. A non-finite price is
/// [`PicsyError::OutOfRange`].
pub fn settle(
    state: &EvaluationState,
    tx: &Transaction,
    solver: &ContributionSolver,
    budget_epsilon: f64,
) -> Result<Settlement> {
    check_range("price", tx.price, f64::NEG_INFINITY, f64::INFINITY)?;
    let b = state.index_of(tx.buyer)?;
    let s = state.index_of(tx.seller)?;
    if b == s {
        return Err(PicsyError::SelfTransaction(tx.buyer));
    }

    let mut e = state.snapshot_matrix();
    let c_b = solver.solve(&e).get(b);
    if c_b <= 0.0 {
        return Err(PicsyError::ZeroContribution { id: tx.buyer, contribution: c_b });
    }

    let alpha = tx.price / c_b;
    if alpha < 0.0 {
        return Err(PicsyError::NegativeTransfer { alpha });
    }
    let budget = e[(b, b)];
    if alpha > budget + budget_epsilon {
        return Err(PicsyError::InsufficientBudget { alpha, budget });
    }

    e[(b, b)] -= alpha;
    e[(b, s)] += alpha;
    e.normalize_rows()?;

    Ok(Settlement { matrix: e, alpha, buyer_contribution: c_b })
}
