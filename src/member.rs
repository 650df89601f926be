//! Community members: stable identity, display name, kind, and status.
//!
//! A member's [`MemberId`] is assigned once and never reused. It is independent
//! of the member's row/column index in the evaluation matrix; the mapping
//! between the two lives in [`crate::state::EvaluationState`].

use core::fmt;

/// Persistent member identifier.
///
/// Ids are allocated sequentially from 1 and survive every matrix operation
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MemberId(u32);

impl MemberId {
    /// Wrap a raw id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for MemberId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// What a member is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberKind {
    /// A natural person.
    Person,
    /// A synthetic member created by founders' investments.
    Company,
}

impl MemberKind {
    /// Upper-case label used by display layers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Company => "COMPANY",
        }
    }
}

/// Lifecycle status. `Ghost` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberStatus {
    /// Participates in natural recovery.
    #[default]
    Active,
    /// Frozen: the member's row is excluded from natural recovery.
    Ghost,
}

impl MemberStatus {
    /// Upper-case label used by display layers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Ghost => "GHOST",
        }
    }
}

/// A community member.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    /// Stable identity.
    pub id: MemberId,
    /// Display name (never empty).
    pub name: String,
    /// Person or company.
    pub kind: MemberKind,
    /// Active or ghost.
    pub status: MemberStatus,
}

impl Member {
    /// A new active member.
    pub fn new(id: MemberId, name: impl Into<String>, kind: MemberKind) -> Self {
        Self { id, name: name.into(), kind, status: MemberStatus::Active }
    }

    /// Whether this member has been ghosted.
    pub fn is_ghost(&self) -> bool {
        self.status == MemberStatus::Ghost
    }

    /// Whether this member is a natural person.
    pub fn is_person(&self) -> bool {
        self.kind == MemberKind::Person
    }
}

/// Spreadsheet-style positional name: 0 → `A`, 25 → `Z`, 26 → `AA`, 27 → `AB`, …
pub fn auto_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    // Only ASCII capitals were pushed.
    letters.into_iter().map(char::from).collect()
}

/// Trim a requested name, rejecting blanks.
pub(crate) fn clean_name(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(crate::PicsyError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_name_single_letters() {
        assert_eq!(auto_name(0), "A");
        assert_eq!(auto_name(1), "B");
        assert_eq!(auto_name(25), "Z");
    }

    #[test]
    fn test_auto_name_rolls_over() {
        assert_eq!(auto_name(26), "AA");
        assert_eq!(auto_name(27), "AB");
        assert_eq!(auto_name(51), "AZ");
        assert_eq!(auto_name(52), "BA");
        assert_eq!(auto_name(701), "ZZ");
        assert_eq!(auto_name(702), "AAA");
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Dana ").unwrap(), "Dana");
        assert_eq!(clean_name("   "), Err(crate::PicsyError::EmptyName));
        assert_eq!(clean_name(""), Err(crate::PicsyError::EmptyName));
    }

    #[test]
    fn test_new_member_is_active() {
        let m = Member::new(MemberId::new(4), "D", MemberKind::Company);
        assert!(!m.is_ghost());
        assert!(!m.is_person());
        assert_eq!(m.status.label(), "ACTIVE");
        assert_eq!(m.kind.label(), "COMPANY");
    }
}
