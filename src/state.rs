//! The committed evaluation matrix and the member arena.
//!
//! [`EvaluationState`] owns `E` together with the append-only member list and
//! the `MemberId → index` map. The three always agree on the community size
//! `N`: every method that changes one of them changes the others in the same
//! call, and every method that can fail validates before writing.
//!
//! The state itself carries no lock. [`crate::community::Community`] keeps it
//! behind a single mutex so that readers never observe `E` and the id map at
//! different sizes.

use hashbrown::HashMap;

use crate::error::{PicsyError, Result};
use crate::matrix::{Matrix, ROW_SUM_TOLERANCE};
use crate::member::{auto_name, clean_name, Member, MemberId, MemberKind, MemberStatus};

/// Evaluation matrix a fresh community starts from (members A, B, C).
pub const SEED_MATRIX: [[f64; 3]; 3] = [
    [0.40, 0.30, 0.30],
    [0.20, 0.30, 0.50],
    [0.25, 0.45, 0.30],
];

/// First id handed out by a new state.
const FIRST_ID: u32 = 1;

/// Evaluation matrix plus stable member identities.
#[derive(Clone, Debug)]
pub struct EvaluationState {
    /// Row-stochastic evaluation matrix, `members.len() × members.len()`.
    matrix: Matrix,
    /// Members in matrix index order. Append-only.
    members: Vec<Member>,
    /// Persistent id → matrix index.
    index_by_id: HashMap<MemberId, usize>,
    /// Next id to allocate. Never decreases.
    next_id: u32,
}

impl EvaluationState {
    /// A community from a normalized matrix, named by `names` or positionally.
    ///
    /// `names` is used only when it has exactly one entry per row; otherwise
    /// members are auto-named `A, B, …, Z, AA, …`. The matrix must already be
    /// row-stochastic.
    pub fn new(names: Option<Vec<String>>, matrix: Matrix) -> Result<Self> {
        let mut state = Self {
            matrix: Matrix::zeros(0),
            members: Vec::new(),
            index_by_id: HashMap::new(),
            next_id: FIRST_ID,
        };
        state.reset(names, matrix)?;
        Ok(state)
    }

    /// The default three-member community over [`SEED_MATRIX`].
    pub fn seeded() -> Self {
        let matrix = Matrix::from_array(&SEED_MATRIX);
        let members = (0..3)
            .map(|i| Member::new(MemberId::new(FIRST_ID + i as u32), auto_name(i), MemberKind::Person))
            .collect::<Vec<_>>();
        let index_by_id = members.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        Self { matrix, members, index_by_id, next_id: FIRST_ID + 3 }
    }

    /// Rebuild from previously exported parts.
    ///
    /// Validates that the matrix matches the member count and is
    /// row-stochastic, that names are non-blank, that ids are unique and that
    /// `next_id` lies beyond every existing id.
    pub fn from_parts(members: Vec<Member>, matrix: Matrix, next_id: u32) -> Result<Self> {
        if matrix.dim() != members.len() {
            return Err(PicsyError::SizeMismatch { expected: members.len(), found: matrix.dim() });
        }
        matrix.check_row_stochastic(ROW_SUM_TOLERANCE)?;
        if next_id < FIRST_ID {
            return Err(PicsyError::OutOfRange { parameter: "next_id", value: f64::from(next_id) });
        }
        let mut index_by_id = HashMap::with_capacity(members.len());
        for (i, m) in members.iter().enumerate() {
            if m.name.trim().is_empty() {
                return Err(PicsyError::EmptyName);
            }
            if m.id.get() >= next_id {
                return Err(PicsyError::OutOfRange { parameter: "next_id", value: f64::from(next_id) });
            }
            if index_by_id.insert(m.id, i).is_some() {
                return Err(PicsyError::DuplicateMember(m.id));
            }
        }
        Ok(Self { matrix, members, index_by_id, next_id })
    }

    // ── Read accessors ─────────────────────────────────────────────────────

    /// Community size `N`.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Borrow the committed matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Deep copy of the committed matrix.
    pub fn snapshot_matrix(&self) -> Matrix {
        self.matrix.clone()
    }

    /// Members in index order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Owned copy of the members in index order.
    pub fn member_list(&self) -> Vec<Member> {
        self.members.clone()
    }

    /// Matrix index bound to `id`.
    pub fn index_of(&self, id: MemberId) -> Result<usize> {
        self.index_by_id
            .get(&id)
            .copied()
            .ok_or(PicsyError::UnknownMember(id))
    }

    /// Member bound to `id`.
    pub fn member(&self, id: MemberId) -> Result<&Member> {
        self.index_of(id).map(|i| &self.members[i])
    }

    /// Whether the row at `index` belongs to a ghost.
    pub fn is_ghost_row(&self, index: usize) -> bool {
        self.members.get(index).is_some_and(Member::is_ghost)
    }

    /// The id the next appended member will receive.
    pub fn peek_next_id(&self) -> MemberId {
        MemberId::new(self.next_id)
    }

    // ── Commits ────────────────────────────────────────────────────────────

    /// Replace `E` with a row-stochastic matrix of the same size.
    pub fn replace_matrix(&mut self, matrix: Matrix) -> Result<()> {
        if matrix.dim() != self.size() {
            return Err(PicsyError::SizeMismatch { expected: self.size(), found: matrix.dim() });
        }
        matrix.check_row_stochastic(ROW_SUM_TOLERANCE)?;
        self.matrix = matrix;
        Ok(())
    }

    /// Grow `N → N+1`: commit `expanded` and bind a fresh id to the new last index.
    pub fn append_member(&mut self, name: String, kind: MemberKind, expanded: Matrix) -> Result<MemberId> {
        let n = self.size();
        if expanded.dim() != n + 1 {
            return Err(PicsyError::SizeMismatch { expected: n + 1, found: expanded.dim() });
        }
        expanded.check_row_stochastic(ROW_SUM_TOLERANCE)?;
        let id = self.allocate_id()?;
        self.members.push(Member::new(id, name, kind));
        self.index_by_id.insert(id, n);
        self.matrix = expanded;
        Ok(id)
    }

    /// Mark `id` as a ghost. Ghosting a ghost is a no-op.
    pub fn set_ghost(&mut self, id: MemberId) -> Result<()> {
        let i = self.index_of(id)?;
        self.members[i].status = MemberStatus::Ghost;
        Ok(())
    }

    /// Replace the whole community. Old ids are retired, never reused.
    pub fn reset(&mut self, names: Option<Vec<String>>, matrix: Matrix) -> Result<Vec<MemberId>> {
        matrix.check_row_stochastic(ROW_SUM_TOLERANCE)?;
        let n = matrix.dim();
        let names = match names {
            Some(names) if names.len() == n => {
                names.iter().map(|s| clean_name(s)).collect::<Result<Vec<_>>>()?
            }
            _ => (0..n).map(auto_name).collect(),
        };

        let first = self.next_id;
        let next_id = u32::try_from(n)
            .ok()
            .and_then(|n| first.checked_add(n))
            .ok_or(PicsyError::OutOfRange { parameter: "next_id", value: f64::from(first) + n as f64 })?;
        let members: Vec<Member> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Member::new(MemberId::new(first + i as u32), name, MemberKind::Person))
            .collect();
        self.next_id = next_id;
        self.index_by_id = members.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        self.members = members;
        self.matrix = matrix;
        Ok(self.members.iter().map(|m| m.id).collect())
    }

    /// Fails with [`PicsyError::OutOfRange`] once the id space is exhausted.
    fn allocate_id(&mut self) -> Result<MemberId> {
        let next = self.next_id.checked_add(1).ok_or(PicsyError::OutOfRange {
            parameter: "next_id",
            value: f64::from(self.next_id),
        })?;
        let id = MemberId::new(self.next_id);
        self.next_id = next;
        Ok(id)
    }
}

impl Default for EvaluationState {
    fn default() -> Self {
        Self::seeded()
    }
}
