//! Snapshot and view serialization through JSON.
//!
//! Verifies that a community's committed state survives a JSON round trip and
//! that restoring rejects snapshots whose parts disagree.

#[cfg(feature = "serde")]
mod tests {
    use picsy_core::snapshot::{CommunitySnapshot, SNAPSHOT_VERSION};
    use picsy_core::{
        Community, CompanyCharter, ContributionSolver, Founder, MemberId, MemberKind, Outflow,
        PicsyError, StateView, Tolerances, Transaction,
    };

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn id(raw: u32) -> MemberId {
        MemberId::new(raw)
    }

    /// A community that has been through a few commits, including a company.
    fn busy_community() -> Community {
        let c = Community::default();
        c.transact(Transaction { buyer: id(2), seller: id(1), price: 0.05 }).unwrap();
        c.add_member("Dana").unwrap();
        c.create_company(&CompanyCharter {
            name: "Mill".into(),
            budget: 0.2,
            founders: vec![Founder { member: id(1), invest: 0.1 }],
            outflows: vec![Outflow { member: id(4), weight: 1.0 }],
        })
        .unwrap();
        c.ghost(id(3)).unwrap();
        c
    }

    // ── Round trips ──────────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_json_round_trip() {
        let original = busy_community();
        let json = serde_json::to_string(&original.snapshot()).unwrap();
        let parsed: CommunitySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, SNAPSHOT_VERSION);

        let restored = Community::restore(parsed, ContributionSolver::default(), Tolerances::default()).unwrap();
        assert_eq!(restored.get_state(), original.get_state());

        // The id counter survives too.
        let view = restored.add_member("Eve").unwrap();
        assert_eq!(view.members.last().map(|m| m.id), Some(id(6)));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(Community::default().snapshot()).unwrap();
        assert_eq!(json["next_id"], 4);
        assert_eq!(json["members"][0]["id"], 1);
        assert_eq!(json["members"][0]["name"], "A");
        assert_eq!(json["matrix"][1][2], 0.5);
    }

    #[test]
    fn test_state_view_serializes() {
        let view = busy_community().get_state();
        let json = serde_json::to_string(&view).unwrap();
        let back: StateView = serde_json::from_str(&json).unwrap();
        assert_eq!(back.members, view.members);
        assert_eq!(back.members[4].kind, MemberKind::Company);
        assert_eq!(back.matrix.dim(), 5);
        assert_eq!(back.contributions.len(), 5);
    }

    // ── Rejections ───────────────────────────────────────────────────────────

    #[test]
    fn test_ragged_matrix_rejected_on_parse() {
        let json = r#"{"version":1,"next_id":3,"members":[],"matrix":[[1.0,0.0],[1.0]]}"#;
        assert!(serde_json::from_str::<CommunitySnapshot>(json).is_err());
    }

    #[test]
    fn test_mismatched_snapshot_rejected_on_restore() {
        let mut snap = busy_community().snapshot();
        snap.members.truncate(2);
        let err = Community::restore(snap, ContributionSolver::default(), Tolerances::default()).unwrap_err();
        assert_eq!(err, PicsyError::SizeMismatch { expected: 2, found: 5 });
    }
}
