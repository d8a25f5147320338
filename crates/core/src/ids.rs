//! Hierarchical, base-26 task identifiers.
//!
//! Stable ids are dash-separated sequences of all-uppercase segments
//! (`A`, `A-BCDE`, `A-BCDE-FF`, ...). Each segment is a bijective
//! base-26 number: segment index `n` maps to letters via
//! [`number_to_letters`], 0 -> `A`, 25 -> `Z`, 26 -> `AA`, 27 -> `AB`.

use crate::error::{Error, Result};
use std::fmt;

/// Encode a zero-based index as an uppercase bijective base-26 segment.
///
/// `numberToLetters(n)` in the source spec: 0 -> A, 25 -> Z, 26 -> AA.
#[must_use]
pub fn number_to_letters(n: u64) -> String {
    let mut n = n + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        let remainder = (n % 26) as u8;
        letters.push(b'A' + remainder);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII uppercase bytes are valid UTF-8")
}

/// Decode an uppercase bijective base-26 segment back to its zero-based index.
///
/// Exact inverse of [`number_to_letters`]: `lettersToNumber(numberToLetters(n)) == n`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `segment` is not one or more uppercase
/// Latin letters.
pub fn letters_to_number(segment: &str) -> Result<u64> {
    validate_segment(segment)?;
    let mut value: u64 = 0;
    for byte in segment.bytes() {
        value = value * 26 + u64::from(byte - b'A' + 1);
    }
    Ok(value - 1)
}

/// Validate a single identifier segment: one or more uppercase Latin letters.
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::validation(format!(
            "invalid identifier segment: {segment:?} (must be one or more uppercase letters)"
        )));
    }
    Ok(())
}

/// Validate a full hierarchical identifier string against the id grammar.
///
/// Rejects empty strings, lowercase or numeric characters, and leading,
/// trailing, or consecutive `-`.
pub fn validate_id_str(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::validation("task id must not be empty"));
    }
    if id.starts_with('-') || id.ends_with('-') || id.contains("--") {
        return Err(Error::validation(format!(
            "task id {id:?} has a leading, trailing, or doubled '-'"
        )));
    }
    for segment in id.split('-') {
        validate_segment(segment)?;
    }
    Ok(())
}

/// A stable, hierarchical task identifier, e.g. `"A"` or `"A-BCDE-FF"`.
///
/// Always validated against the id grammar at construction; there is no
/// way to hold a `TaskId` with invalid syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Parse and validate a raw id string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `raw` does not match the id grammar.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        validate_id_str(&raw)?;
        Ok(Self(raw))
    }

    /// Build the root id for segment index `n` (0-based).
    #[must_use]
    pub fn root(n: u64) -> Self {
        Self(number_to_letters(n))
    }

    /// Build a child id by appending segment index `n` to this id.
    #[must_use]
    pub fn child(&self, n: u64) -> Self {
        Self(format!("{}-{}", self.0, number_to_letters(n)))
    }

    /// The raw string form of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split this id into its root id and the ordered list of non-root
    /// segments, with the resulting depth (number of non-root segments).
    #[must_use]
    pub fn parse_parts(&self) -> ParsedTaskId {
        let mut parts = self.0.split('-');
        let root = parts.next().unwrap_or_default().to_string();
        let segments: Vec<String> = parts.map(str::to_string).collect();
        let depth = segments.len();
        ParsedTaskId {
            root_id: root,
            segments,
            depth,
        }
    }

    /// The parent id, if this is not a root id.
    #[must_use]
    pub fn parent(&self) -> Option<TaskId> {
        self.0.rfind('-').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Whether this is a root id (single segment, no `-`).
    #[must_use]
    pub fn is_root(&self) -> bool {
        !self.0.contains('-')
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The decomposed form of a [`TaskId`]: its root segment, the ordered
/// non-root segments, and their count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTaskId {
    /// The root id (first segment).
    pub root_id: String,
    /// Non-root segments, in path order.
    pub segments: Vec<String>,
    /// Number of non-root segments (equal to `segments.len()`).
    pub depth: usize,
}

/// Validate that `child` is exactly `parent` extended by one segment.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `child` is not `parent` plus a single
/// additional `-`-joined segment, or [`Error::Conflict`] if `child == parent`.
pub fn validate_subtask_id(child: &TaskId, parent: &TaskId) -> Result<()> {
    if child == parent {
        return Err(Error::conflict("a task cannot be its own child"));
    }
    let prefix = format!("{parent}-");
    let Some(rest) = child.as_str().strip_prefix(&prefix) else {
        return Err(Error::validation(format!(
            "{child} is not a direct subtask id of {parent}"
        )));
    };
    if rest.is_empty() || rest.contains('-') {
        return Err(Error::validation(format!(
            "{child} must extend {parent} by exactly one segment"
        )));
    }
    validate_segment(rest)?;
    Ok(())
}

/// An in-memory tag for a subtree added before reconciliation, not yet
/// assigned a stable [`TaskId`] by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ProvisionalId(String);

impl ProvisionalId {
    /// Wrap an arbitrary in-memory tag as a provisional id.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProvisionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either a stable, store-assigned id or a provisional, in-memory one.
///
/// Pending operations recorded before a flush may reference nodes that
/// don't have a stable id yet (a subtree added and then immediately
/// mutated in the same batch), so every pending-operation endpoint is a
/// `NodeId` rather than a bare `TaskId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum NodeId {
    /// A store-assigned, validated hierarchical id.
    Stable(TaskId),
    /// An in-memory tag for a not-yet-flushed node.
    Provisional(ProvisionalId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable(id) => write!(f, "{id}"),
            Self::Provisional(id) => write!(f, "{id}"),
        }
    }
}

impl From<TaskId> for NodeId {
    fn from(value: TaskId) -> Self {
        Self::Stable(value)
    }
}

impl From<ProvisionalId> for NodeId {
    fn from(value: ProvisionalId) -> Self {
        Self::Provisional(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_known_values() {
        assert_eq!(number_to_letters(0), "A");
        assert_eq!(number_to_letters(25), "Z");
        assert_eq!(number_to_letters(26), "AA");
        assert_eq!(number_to_letters(27), "AB");
        assert_eq!(number_to_letters(701), "ZZ");
        assert_eq!(number_to_letters(702), "AAA");
    }

    #[test]
    fn round_trips_known_values() {
        for n in [0, 1, 25, 26, 27, 100, 701, 702, 18277] {
            assert_eq!(letters_to_number(&number_to_letters(n)).unwrap(), n);
        }
    }

    proptest! {
        #[test]
        fn round_trips_any_value(n in 0u64..1_000_000) {
            let letters = number_to_letters(n);
            prop_assert_eq!(letters_to_number(&letters).unwrap(), n);
        }
    }

    #[test]
    fn rejects_invalid_grammar() {
        assert!(TaskId::parse("").is_err());
        assert!(TaskId::parse("a").is_err());
        assert!(TaskId::parse("A1").is_err());
        assert!(TaskId::parse("-A").is_err());
        assert!(TaskId::parse("A-").is_err());
        assert!(TaskId::parse("A--B").is_err());
        assert!(TaskId::parse("Ab").is_err());
        assert!(TaskId::parse("A-B").is_ok());
    }

    #[test]
    fn json_round_trips_through_try_from_string() {
        let id = TaskId::parse("A-BCDE").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"A-BCDE\"");
        assert_eq!(serde_json::from_str::<TaskId>(&json).unwrap(), id);
    }

    #[test]
    fn json_rejects_malformed_id() {
        assert!(serde_json::from_str::<TaskId>("\"a1\"").is_err());
    }

    #[test]
    fn parses_hierarchy() {
        let id = TaskId::parse("A-BCDE").unwrap();
        let parsed = id.parse_parts();
        assert_eq!(parsed.root_id, "A");
        assert_eq!(parsed.segments, vec!["BCDE".to_string()]);
        assert_eq!(parsed.depth, 1);
    }

    #[test]
    fn validates_direct_subtask() {
        let parent = TaskId::parse("A").unwrap();
        let child = TaskId::parse("A-BCDE").unwrap();
        assert!(validate_subtask_id(&child, &parent).is_ok());

        let grandchild = TaskId::parse("A-BCDE-FF").unwrap();
        assert!(validate_subtask_id(&grandchild, &parent).is_err());
        assert!(validate_subtask_id(&grandchild, &child).is_ok());
    }

    #[test]
    fn parent_of_root_is_none() {
        let root = TaskId::parse("A").unwrap();
        assert_eq!(root.parent(), None);
        assert!(root.is_root());

        let child = TaskId::parse("A-B").unwrap();
        assert_eq!(child.parent(), Some(root));
        assert!(!child.is_root());
    }
}
