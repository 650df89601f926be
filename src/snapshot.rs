//! Portable snapshot of a community's committed state.
//!
//! A [`CommunitySnapshot`] captures everything needed to rebuild an
//! [`EvaluationState`]: the member arena in index order, the evaluation matrix
//! and the id counter. It is meant for transport between processes, not as a
//! durable storage format.
//!
//! ```rust,ignore
//! let snapshot = community.snapshot();
//! let json = serde_json::to_string(&snapshot)?;
//! let restored = Community::restore(serde_json::from_str(&json)?, solver, tolerances)?;
//! ```
//!
//! Restoring re-validates every structural invariant, so a hand-edited or
//! corrupted snapshot is rejected instead of producing an inconsistent state.
//!
//! This module requires the `serde` feature.

use crate::community::Community;
use crate::economy::Tolerances;
use crate::error::{PicsyError, Result};
use crate::matrix::{Matrix, ROW_SUM_TOLERANCE};
use crate::member::Member;
use crate::solver::ContributionSolver;
use crate::state::EvaluationState;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Serializable copy of an [`EvaluationState`].
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct CommunitySnapshot {
    /// Format version, [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Next id the community would allocate.
    pub next_id: u32,
    /// Members in matrix index order.
    pub members: Vec<Member>,
    /// Evaluation matrix as a list of rows.
    pub matrix: Matrix,
}

impl From<&EvaluationState> for CommunitySnapshot {
    fn from(state: &EvaluationState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_id: state.peek_next_id().get(),
            members: state.member_list(),
            matrix: state.snapshot_matrix(),
        }
    }
}

impl CommunitySnapshot {
    /// Rebuild the state this snapshot describes.
    ///
    /// Rows that do not already sum to 1 are normalized; a row that cannot be
    /// normalized is [`PicsyError::DegenerateRow`]. Fails with
    /// [`PicsyError::OutOfRange`] on an unknown version.
    pub fn into_state(self) -> Result<EvaluationState> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PicsyError::OutOfRange { parameter: "version", value: f64::from(self.version) });
        }
        let mut matrix = self.matrix;
        if !matrix.is_row_stochastic(ROW_SUM_TOLERANCE) {
            matrix.normalize_rows()?;
        }
        EvaluationState::from_parts(self.members, matrix, self.next_id)
    }
}

impl Community {
    /// Capture the committed state.
    pub fn snapshot(&self) -> CommunitySnapshot {
        CommunitySnapshot::from(&*self.lock())
    }

    /// Build a community from a snapshot after validating it.
    pub fn restore(
        snapshot: CommunitySnapshot,
        solver: ContributionSolver,
        tolerances: Tolerances,
    ) -> Result<Self> {
        let community = snapshot
            .into_state()
            .and_then(|state| Self::from_state(state, solver, tolerances))
            .map_err(|err| {
                tracing::warn!(error = %err, "rejected snapshot");
                err
            })?;
        {
            let state = community.lock();
            tracing::info!(size = state.size(), next_id = %state.peek_next_id(), "restored snapshot");
        }
        Ok(community)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{MemberId, MemberKind};

    #[test]
    fn test_snapshot_of_seeded_state() {
        let snap = CommunitySnapshot::from(&EvaluationState::seeded());
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.next_id, 4);
        assert_eq!(snap.members.len(), 3);
        assert_eq!(snap.matrix.dim(), 3);
    }

    #[test]
    fn test_into_state_keeps_ids_and_counter() {
        let c = Community::default();
        c.add_member("Dana").unwrap();
        let restored = c.snapshot().into_state().unwrap();
        assert_eq!(restored.size(), 4);
        assert_eq!(restored.index_of(MemberId::new(4)), Ok(3));
        assert_eq!(restored.peek_next_id(), MemberId::new(5));
    }

    #[test]
    fn test_unnormalized_matrix_is_normalized() {
        let mut snap = CommunitySnapshot::from(&EvaluationState::seeded());
        snap.matrix = Matrix::from_rows(vec![vec![2.0, 1.0, 1.0], vec![0.0, 1.0, 1.0], vec![1.0, 1.0, 2.0]]).unwrap();
        let state = snap.into_state().unwrap();
        assert_eq!(state.matrix()[(0, 0)], 0.5);
        assert!(state.matrix().is_row_stochastic(1e-12));
    }

    #[test]
    fn test_rejects_inconsistent_snapshots() {
        let base = CommunitySnapshot::from(&EvaluationState::seeded());

        let mut snap = base.clone();
        snap.version = 9;
        assert!(matches!(snap.into_state(), Err(PicsyError::OutOfRange { parameter: "version", .. })));

        let mut snap = base.clone();
        snap.members.pop();
        assert!(matches!(snap.into_state(), Err(PicsyError::SizeMismatch { .. })));

        let mut snap = base.clone();
        snap.members[2] = Member::new(MemberId::new(1), "dup", MemberKind::Person);
        assert_eq!(snap.into_state().unwrap_err(), PicsyError::DuplicateMember(MemberId::new(1)));

        let mut snap = base.clone();
        snap.next_id = 3;
        assert!(matches!(snap.into_state(), Err(PicsyError::OutOfRange { parameter: "next_id", .. })));

        let mut snap = base;
        snap.matrix = Matrix::from_rows(vec![vec![1.0, 0.0, 0.0], vec![0.0; 3], vec![0.0, 0.0, 1.0]]).unwrap();
        assert!(matches!(snap.into_state(), Err(PicsyError::DegenerateRow { row: 1, .. })));
    }

    #[test]
    fn test_blank_member_name_rejected() {
        let mut snap = CommunitySnapshot::from(&EvaluationState::seeded());
        snap.members[1] = Member::new(MemberId::new(2), "  ", MemberKind::Person);
        assert_eq!(snap.into_state().unwrap_err(), PicsyError::EmptyName);
    }

    #[test]
    fn test_restore_rejects_unusable_solver() {
        let snap = CommunitySnapshot::from(&EvaluationState::seeded());
        let solver = ContributionSolver { max_iterations: 0, ..ContributionSolver::default() };
        let err = Community::restore(snap.clone(), solver, Tolerances::default()).err();
        assert!(matches!(err, Some(PicsyError::OutOfRange { parameter: "max_iterations", .. })));

        let tolerances = Tolerances { decomposition_floor: -1.0, ..Tolerances::default() };
        let err = Community::restore(snap, ContributionSolver::default(), tolerances).err();
        assert!(matches!(err, Some(PicsyError::OutOfRange { parameter: "decomposition_floor", .. })));
    }
}
