/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Company creation and virtual dissolution.
//!
//! # Creation
//!
//! A company is a synthetic member appended at index `N`. Each founder `i`
//! investing `v` moves `v` of its outgoing evaluation onto the company:
//!
//! ```text
//! r        = 1 − E[i][i]                  (founder residual)
//! E[i][j] ← E[i][j] · (r − v) / r         for j ≠ i, j < N
//! E[i][N] = v
//! ```
//!
//! The company keeps `budget` as self-evaluation and spreads `1 − budget` over
//! its declared outflow targets in proportion to their weights.
//!
//! # Decomposition
//!
//! Folding company `x` back onto the people it connects is a Schur-complement
//! style elimination of one node from the evaluation graph:
//!
//! ```text
//! Ĥ[a][b] = E[i][j] + E[i][x] · E[x][j] / max(1 − E[x][x], floor)
//! ```
//!
//! over people `i, j` only (`a, b` are their positions among people). The
//! result is row-normalized and never committed.

use crate::economy::{check_range, Tolerances};
use crate::error::{PicsyError, Result};
use crate::matrix::Matrix;
use crate::member::{clean_name, Member, MemberId, MemberKind};
use crate::state::EvaluationState;

/// Largest self-budget a company may keep.
pub const MAX_COMPANY_BUDGET: f64 = 0.9;

/// One founder's stake.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Founder {
    /// Investing member.
    pub member: MemberId,
    /// Evaluation mass moved onto the company, `0 ≤ invest ≤ 1 − E[i][i]`.
    pub invest: f64,
}

/// One outflow target of the company's evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outflow {
    /// Receiving member.
    pub member: MemberId,
    /// Relative weight, `≥ 0`.
    pub weight: f64,
}

/// Everything needed to found a company.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompanyCharter {
    /// Display name.
    pub name: String,
    /// Company self-budget `E[x][x]`, in `[0, MAX_COMPANY_BUDGET]`.
    pub budget: f64,
    /// Founding investments. Repeated members are summed.
    pub founders: Vec<Founder>,
    /// Where the company's evaluation flows. Repeated members are summed.
    pub outflows: Vec<Outflow>,
}

/// A people-only view of the community with one company folded out.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decomposition {
    /// People in their original index order.
    pub people: Vec<Member>,
    /// Row-normalized `Ĥ`, one row/column per entry of `people`.
    pub matrix: Matrix,
}

/// Validate a charter and build the expanded, row-normalized matrix.
///
/// Returns the cleaned company name alongside the matrix.
pub fn charter(
    state: &EvaluationState,
    charter: &CompanyCharter,
    tolerances: &Tolerances,
) -> Result<(String, Matrix)> {
    let name = clean_name(&charter.name)?;
    check_range("budget", charter.budget, 0.0, MAX_COMPANY_BUDGET)?;

    for f in &charter.founders {
        if f.invest.is_nan() || f.invest < 0.0 {
            return Err(PicsyError::NegativeInvestment { id: f.member, invest: f.invest });
        }
    }
    for o in &charter.outflows {
        check_range("outflow weight", o.weight, 0.0, f64::MAX)?;
    }

    let founders = merge(state, charter.founders.iter().map(|f| (f.member, f.invest)))?;
    let outflows = merge(state, charter.outflows.iter().map(|o| (o.member, o.weight)))?;
    let weight_sum: f64 = outflows.iter().map(|(_, _, w)| w).sum();
    check_range("outflow weight sum", weight_sum, f64::NEG_INFINITY, f64::MAX)?;
    if weight_sum <= 0.0 {
        return Err(PicsyError::EmptyOutflow(weight_sum));
    }

    let n = state.size();
    let mut grown = state.matrix().grown();

    for &(id, i, invest) in &founders {
        let residual = 1.0 - grown[(i, i)];
        if invest > residual + tolerances.budget_epsilon {
            return Err(PicsyError::OverInvestment { id, invest, residual });
        }
        if residual > 0.0 {
            let scale = ((residual - invest) / residual).max(0.0);
            for (j, x) in grown.row_mut(i)[..n].iter_mut().enumerate() {
                if j != i {
                    *x *= scale;
                }
            }
        }
        grown[(i, n)] = invest;
    }

    grown[(n, n)] = charter.budget;
    let spread = 1.0 - charter.budget;
    for &(_, j, weight) in &outflows {
        grown[(n, j)] = spread * weight / weight_sum;
    }

    grown.normalize_rows()?;
    Ok((name, grown))
}

/// Fold company `company` out of the evaluation graph, keeping people only.
///
/// Fails with [`PicsyError::UnknownMember`], [`PicsyError::NotCompany`], or
/// [`PicsyError::DegenerateRow`] if some person evaluates nobody but companies.
pub fn decompose(
    state: &EvaluationState,
    company: MemberId,
    tolerances: &Tolerances,
) -> Result<Decomposition> {
    let x = state.index_of(company)?;
    if state.members()[x].kind != MemberKind::Company {
        return Err(PicsyError::NotCompany(company));
    }

    let e = state.matrix();
    let (people_idx, people): (Vec<usize>, Vec<Member>) = state
        .members()
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_person())
        .map(|(i, m)| (i, m.clone()))
        .unzip();

    let denom = (1.0 - e[(x, x)]).max(tolerances.decomposition_floor);
    let m = people_idx.len();
    let mut h = Matrix::zeros(m);
    for (a, &i) in people_idx.iter().enumerate() {
        let via = e[(i, x)] / denom;
        for (b, &j) in people_idx.iter().enumerate() {
            h[(a, b)] = e[(i, j)] + via * e[(x, j)];
        }
    }

    h.normalize_rows()?;
    Ok(Decomposition { people, matrix: h })
}

/// Resolve ids to indices and sum repeated entries, keeping first-seen order.
fn merge(
    state: &EvaluationState,
    entries: impl Iterator<Item = (MemberId, f64)>,
) -> Result<Vec<(MemberId, usize, f64)>> {
    let mut out: Vec<(MemberId, usize, f64)> = Vec::new();
    for (id, amount) in entries {
        let index = state.index_of(id)?;
        match out.iter_mut().find(|(other, _, _)| *other == id) {
            Some(slot) => slot.2 += amount,
            None => out.push((id, index, amount)),
        }
    }
    Ok(out)
}
