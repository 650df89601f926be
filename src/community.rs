//! Thread-safe community façade.
//!
//! [`Community`] owns one [`EvaluationState`] behind a single mutex. Each
//! operation locks once, prices the change with a pure function from
//! [`crate::economy`], commits on success and builds the returned
//! [`StateView`] before releasing the lock. Operations are therefore fully
//! serialized, and a view always describes exactly the state that was
//! committed.
//!
//! # Invariants
//! - A rejected operation leaves the committed state untouched.
//! - `E` and the member list agree on `N` whenever the lock is free.
//! - Every committed matrix is row-stochastic.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::economy::{self, CompanyCharter, Decomposition, Tolerances, Transaction};
use crate::error::{PicsyError, Result};
use crate::matrix::Matrix;
use crate::member::{clean_name, Member, MemberId, MemberKind};
use crate::solver::{purchasing_power, ContributionSolver};
use crate::state::EvaluationState;

/// Everything a caller sees after an operation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateView {
    /// Members in matrix index order.
    pub members: Vec<Member>,
    /// Committed evaluation matrix.
    pub matrix: Matrix,
    /// Contribution per member, summing to `N`.
    pub contributions: Vec<f64>,
    /// `E[i][i] · c[i]` per member.
    pub purchasing_power: Vec<f64>,
}

impl StateView {
    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Index of `id` in this view.
    pub fn position(&self, id: MemberId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }
}

/// A PICSY community: evaluation state plus the engine settings that drive it.
#[derive(Debug)]
pub struct Community {
    state: Mutex<EvaluationState>,
    solver: ContributionSolver,
    tolerances: Tolerances,
}

impl Default for Community {
    fn default() -> Self {
        Self::assemble(EvaluationState::seeded(), ContributionSolver::default(), Tolerances::default())
    }
}

impl Community {
    /// Build a community from a validated configuration.
    pub fn new(config: EngineConfig) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        let state = match &config.seed {
            Some(seed) => {
                let matrix = normalized_input(seed.matrix.clone())?;
                EvaluationState::new(seed.names.clone(), matrix)?
            }
            None => EvaluationState::seeded(),
        };
        Ok(Self::assemble(state, config.solver.clone(), config.tolerances()))
    }

    /// Wrap an existing state after validating the solver and tolerances.
    pub fn from_state(state: EvaluationState, solver: ContributionSolver, tolerances: Tolerances) -> Result<Self> {
        solver.validate()?;
        tolerances.validate()?;
        Ok(Self::assemble(state, solver, tolerances))
    }

    fn assemble(state: EvaluationState, solver: ContributionSolver, tolerances: Tolerances) -> Self {
        Self { state: Mutex::new(state), solver, tolerances }
    }

    /// Solver used for every contribution computation.
    pub fn solver(&self) -> &ContributionSolver {
        &self.solver
    }

    /// Numerical slack used by the economic operations.
    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// Current members, matrix, contributions and purchasing power.
    pub fn get_state(&self) -> StateView {
        let state = self.lock();
        self.view(&state)
    }

    /// People-only matrix with company `id` folded out. Never commits.
    pub fn decompose_company(&self, id: MemberId) -> Result<Decomposition> {
        let state = self.lock();
        economy::decompose(&state, id, &self.tolerances).map_err(|e| rejected("decompose_company", e))
    }

    // ─── Commits ─────────────────────────────────────────────────────────────

    /// Normalize `rows` and replace `E`. The size must match the community.
    pub fn set_matrix(&self, rows: Vec<Vec<f64>>) -> Result<StateView> {
        let mut state = self.lock();
        normalized_input(rows)
            .and_then(|m| state.replace_matrix(m))
            .map_err(|e| rejected("set_matrix", e))?;
        info!(op = "set_matrix", size = state.size(), "committed");
        Ok(self.view(&state))
    }

    /// Decay every non-ghost row toward self-reliance at rate `gamma`.
    pub fn recover(&self, gamma: f64) -> Result<StateView> {
        let mut state = self.lock();
        economy::recover(&state, gamma)
            .and_then(|m| state.replace_matrix(m))
            .map_err(|e| rejected("recover", e))?;
        info!(op = "recover", gamma, "committed");
        Ok(self.view(&state))
    }

    /// Settle a fixed-price purchase.
    pub fn transact(&self, tx: Transaction) -> Result<StateView> {
        let mut state = self.lock();
        let settlement = economy::settle(&state, &tx, &self.solver, self.tolerances.budget_epsilon)
            .map_err(|e| rejected("transact", e))?;
        state
            .replace_matrix(settlement.matrix)
            .map_err(|e| rejected("transact", e))?;
        info!(
            op = "transact",
            buyer = %tx.buyer,
            seller = %tx.seller,
            price = tx.price,
            alpha = settlement.alpha,
            buyer_contribution = settlement.buyer_contribution,
            "committed"
        );
        Ok(self.view(&state))
    }

    /// Append a person named `name`.
    pub fn add_member(&self, name: &str) -> Result<StateView> {
        let mut state = self.lock();
        let id = clean_name(name)
            .and_then(|name| {
                let expanded = economy::onboard(&state, &self.solver)?;
                state.append_member(name, MemberKind::Person, expanded)
            })
            .map_err(|e| rejected("add_member", e))?;
        info!(op = "add_member", id = %id, size = state.size(), "committed");
        Ok(self.view(&state))
    }

    /// Mark `id` as a ghost. Already-ghosted members succeed unchanged.
    pub fn ghost(&self, id: MemberId) -> Result<StateView> {
        let mut state = self.lock();
        state.set_ghost(id).map_err(|e| rejected("ghost", e))?;
        info!(op = "ghost", id = %id, "committed");
        Ok(self.view(&state))
    }

    /// Found a company from `charter` and append it.
    pub fn create_company(&self, charter: &CompanyCharter) -> Result<StateView> {
        let mut state = self.lock();
        let id = economy::charter(&state, charter, &self.tolerances)
            .and_then(|(name, expanded)| state.append_member(name, MemberKind::Company, expanded))
            .map_err(|e| rejected("create_company", e))?;
        info!(
            op = "create_company",
            id = %id,
            budget = charter.budget,
            founders = charter.founders.len(),
            size = state.size(),
            "committed"
        );
        Ok(self.view(&state))
    }

    /// Replace the whole community. Ids keep counting from where they were.
    pub fn initialize(&self, names: Option<Vec<String>>, rows: Vec<Vec<f64>>) -> Result<StateView> {
        let mut state = self.lock();
        let ids = normalized_input(rows)
            .and_then(|m| state.reset(names, m))
            .map_err(|e| rejected("initialize", e))?;
        info!(
            op = "initialize",
            size = ids.len(),
            first_id = ids.first().map(|id| id.get()),
            "committed"
        );
        Ok(self.view(&state))
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    /// Commits are single assignments, so a panic elsewhere cannot tear the state.
    pub(crate) fn lock(&self) -> MutexGuard<'_, EvaluationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn view(&self, state: &EvaluationState) -> StateView {
        let contributions = self.solver.solve(state.matrix()).values;
        let purchasing_power = purchasing_power(state.matrix(), &contributions);
        StateView {
            members: state.member_list(),
            matrix: state.snapshot_matrix(),
            contributions,
            purchasing_power,
        }
    }
}

/// Parse caller-supplied rows: non-empty, square, finite, then row-normalized.
fn normalized_input(rows: Vec<Vec<f64>>) -> Result<Matrix> {
    if rows.is_empty() {
        return Err(PicsyError::EmptyMatrix);
    }
    let mut m = Matrix::from_rows(rows)?;
    m.normalize_rows()?;
    Ok(m)
}

fn rejected(op: &'static str, err: PicsyError) -> PicsyError {
    warn!(op, error = %err, "rejected");
    err
}
