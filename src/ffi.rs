//! Python FFI bindings via PyO3.
//!
//! Exposes [`Community`] to Python. Every error surfaces as `ValueError`
//! carrying the Rust error's display text.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from picsy_core import Community
//!
//! community = Community()                       # members A, B, C
//! state = community.transact(1, 2, 0.1)
//! print(state.contributions)                    # sums to 3.0
//! state = community.add_member("Dana")
//! state = community.create_company("Co-op", 0.1, [(1, 0.2)], [(2, 1.0), (4, 1.0)])
//! people, matrix = community.decompose_company(5)
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::community::{Community, StateView};
use crate::config::{EngineConfig, SeedConfig};
use crate::economy::{CompanyCharter, Founder, Outflow, Transaction};
use crate::member::{Member, MemberId};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// `(id, name, kind, status)` as seen from Python.
type PyMember = (u32, String, String, String);

fn py_member(m: &Member) -> PyMember {
    (m.id.get(), m.name.clone(), m.kind.label().to_string(), m.status.label().to_string())
}

// ── StateView ────────────────────────────────────────────────────────────────

/// Snapshot returned by every operation.
#[pyclass(name = "StateView", frozen)]
pub struct PyStateView {
    /// List of `(id, name, kind, status)` in matrix order.
    #[pyo3(get)]
    members: Vec<PyMember>,
    /// Evaluation matrix as a list of rows.
    #[pyo3(get)]
    matrix: Vec<Vec<f64>>,
    /// Contribution per member, summing to the member count.
    #[pyo3(get)]
    contributions: Vec<f64>,
    /// Self-budget times contribution per member.
    #[pyo3(get)]
    purchasing_power: Vec<f64>,
}

impl From<StateView> for PyStateView {
    fn from(v: StateView) -> Self {
        Self {
            members: v.members.iter().map(py_member).collect(),
            matrix: v.matrix.to_rows(),
            contributions: v.contributions,
            purchasing_power: v.purchasing_power,
        }
    }
}

#[pymethods]
impl PyStateView {
    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("StateView(members={})", self.members.len())
    }
}

// ── Community ────────────────────────────────────────────────────────────────

/// A PICSY community.
///
/// Args:
///     names:  optional member names, one per matrix row
///     matrix: optional square evaluation matrix; defaults to the A, B, C seed
#[pyclass(name = "Community", frozen)]
pub struct PyCommunity {
    inner: Community,
}

#[pymethods]
impl PyCommunity {
    /// Build a community, seeded with A, B, C unless `matrix` is given.
    #[new]
    #[pyo3(signature = (names=None, matrix=None))]
    pub fn new(names: Option<Vec<String>>, matrix: Option<Vec<Vec<f64>>>) -> PyResult<Self> {
        let config = EngineConfig {
            seed: matrix.map(|matrix| SeedConfig { names, matrix }),
            ..EngineConfig::default()
        };
        Community::new(config).map(|inner| Self { inner }).map_err(value_error)
    }

    /// Current members, matrix, contributions and purchasing power.
    pub fn get_state(&self) -> PyStateView {
        self.inner.get_state().into()
    }

    /// Normalize and replace the evaluation matrix.
    pub fn set_matrix(&self, matrix: Vec<Vec<f64>>) -> PyResult<PyStateView> {
        self.inner.set_matrix(matrix).map(Into::into).map_err(value_error)
    }

    /// Decay every non-ghost row toward self-evaluation at rate gamma in [0, 1].
    pub fn recover(&self, gamma: f64) -> PyResult<PyStateView> {
        self.inner.recover(gamma).map(Into::into).map_err(value_error)
    }

    /// Buyer pays `price` to seller out of its self-budget.
    pub fn transact(&self, buyer: u32, seller: u32, price: f64) -> PyResult<PyStateView> {
        let tx = Transaction { buyer: MemberId::new(buyer), seller: MemberId::new(seller), price };
        self.inner.transact(tx).map(Into::into).map_err(value_error)
    }

    /// Append a person.
    pub fn add_member(&self, name: &str) -> PyResult<PyStateView> {
        self.inner.add_member(name).map(Into::into).map_err(value_error)
    }

    /// Mark a member as a ghost.
    pub fn ghost(&self, id: u32) -> PyResult<PyStateView> {
        self.inner.ghost(MemberId::new(id)).map(Into::into).map_err(value_error)
    }

    /// Found a company.
    ///
    /// Args:
    ///     name:     company name
    ///     budget:   self-budget in [0, 0.9]
    ///     founders: list of (member_id, invest)
    ///     outflows: list of (member_id, weight)
    pub fn create_company(
        &self,
        name: String,
        budget: f64,
        founders: Vec<(u32, f64)>,
        outflows: Vec<(u32, f64)>,
    ) -> PyResult<PyStateView> {
        let charter = CompanyCharter {
            name,
            budget,
            founders: founders
                .into_iter()
                .map(|(id, invest)| Founder { member: MemberId::new(id), invest })
                .collect(),
            outflows: outflows
                .into_iter()
                .map(|(id, weight)| Outflow { member: MemberId::new(id), weight })
                .collect(),
        };
        self.inner.create_company(&charter).map(Into::into).map_err(value_error)
    }

    /// People-only view with a company folded out.
    ///
    /// Returns:
    ///     (people, matrix) where people is a list of (id, name, kind, status)
    pub fn decompose_company(&self, id: u32) -> PyResult<(Vec<PyMember>, Vec<Vec<f64>>)> {
        let d = self.inner.decompose_company(MemberId::new(id)).map_err(value_error)?;
        Ok((d.people.iter().map(py_member).collect(), d.matrix.to_rows()))
    }

    /// Replace the whole community.
    #[pyo3(signature = (matrix, names=None))]
    pub fn initialize(&self, matrix: Vec<Vec<f64>>, names: Option<Vec<String>>) -> PyResult<PyStateView> {
        self.inner.initialize(names, matrix).map(Into::into).map_err(value_error)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("Community(members={})", self.inner.get_state().size())
    }
}

// ── Module entry point ───────────────────────────────────────────────────────

/// PICSY contribution economy.
#[pymodule]
pub fn picsy_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCommunity>()?;
    m.add_class::<PyStateView>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
