//! Error kinds for every rejected operation.
//!
//! Every variant is a local validation failure on a single request. When an
//! operation returns one of these, nothing was committed and the previous
//! state remains authoritative.

use thiserror::Error;

use crate::member::MemberId;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PicsyError>;

/// Named failure reported to the caller of a core operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PicsyError {
    /// A row cannot be normalized because its (clamped) sum is not positive.
    #[error("row {row} cannot be normalized (sum = {sum})")]
    DegenerateRow {
        /// Row index in the matrix being normalized.
        row: usize,
        /// Sum of the row after clamping negatives to zero.
        sum: f64,
    },

    /// A matrix offered for commit has a negative entry or a row not summing to 1.
    #[error("row {row} is not stochastic (sum = {sum})")]
    NotStochastic {
        /// First offending row.
        row: usize,
        /// Compensated sum of that row.
        sum: f64,
    },

    /// Matrix dimension disagrees with the member count, or the matrix is not square.
    #[error("matrix size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// Dimension the receiver requires.
        expected: usize,
        /// Dimension that was supplied.
        found: usize,
    },

    /// A matrix with zero rows was supplied where a community is required.
    #[error("matrix is empty")]
    EmptyMatrix,

    /// A matrix entry is NaN or infinite.
    #[error("matrix entry [{row}][{col}] is not finite")]
    NonFinite {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },

    /// The referenced member id is not bound to any matrix index.
    #[error("unknown member {0}")]
    UnknownMember(MemberId),

    /// Two members in one community share an id.
    #[error("member id {0} is bound twice")]
    DuplicateMember(MemberId),

    /// Buyer and seller are the same member.
    #[error("buyer and seller are the same member ({0})")]
    SelfTransaction(MemberId),

    /// The buyer's contribution is zero, so no price can be converted to evaluation.
    #[error("member {id} has no contribution ({contribution})")]
    ZeroContribution {
        /// Buyer id.
        id: MemberId,
        /// The buyer's computed contribution.
        contribution: f64,
    },

    /// The evaluation transfer derived from the price is negative.
    #[error("evaluation transfer is negative (alpha = {alpha})")]
    NegativeTransfer {
        /// The rejected transfer.
        alpha: f64,
    },

    /// The transfer exceeds the buyer's retained self-budget.
    #[error("insufficient budget: alpha = {alpha}, budget = {budget}")]
    InsufficientBudget {
        /// The requested transfer.
        alpha: f64,
        /// The buyer's current diagonal entry.
        budget: f64,
    },

    /// A founder offered a negative investment.
    #[error("member {id} offered a negative investment ({invest})")]
    NegativeInvestment {
        /// Founder id.
        id: MemberId,
        /// The rejected investment.
        invest: f64,
    },

    /// A founder invested more than its residual (1 − self-budget).
    #[error("member {id} invested {invest} but only {residual} is available")]
    OverInvestment {
        /// Founder id.
        id: MemberId,
        /// The rejected investment.
        invest: f64,
        /// The founder's residual evaluation mass.
        residual: f64,
    },

    /// Company outflow weights do not sum to a positive value.
    #[error("company outflow weights sum to {0}")]
    EmptyOutflow(f64),

    /// A member name is empty after trimming.
    #[error("member name is empty")]
    EmptyName,

    /// A scalar parameter lies outside its admissible range.
    #[error("{parameter} = {value} is out of range")]
    OutOfRange {
        /// Name of the parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Decomposition was requested for a member that is not a company.
    #[error("member {0} is not a company")]
    NotCompany(MemberId),
}
