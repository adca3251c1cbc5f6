//! Stereo pair / triplet of source ids.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered combination of sources processed together by stereo.
///
/// Triplets are a first-class variant: every consumer matches on both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pair {
    Stereo([String; 2]),
    Triplet([String; 3]),
}

impl Pair {
    /// Build a two-way pair.
    pub fn stereo(left: impl Into<String>, right: impl Into<String>) -> Self {
        Pair::Stereo([left.into(), right.into()])
    }

    /// Build a three-way triplet.
    pub fn triplet(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        Pair::Triplet([a.into(), b.into(), c.into()])
    }

    /// Build from a list of 2 or 3 ids.
    ///
    /// Returns `None` for any other width.
    pub fn from_ids(ids: Vec<String>) -> Option<Self> {
        let mut ids = ids.into_iter();
        match (ids.next(), ids.next(), ids.next(), ids.next()) {
            (Some(a), Some(b), None, None) => Some(Pair::Stereo([a, b])),
            (Some(a), Some(b), Some(c), None) => Some(Pair::Triplet([a, b, c])),
            _ => None,
        }
    }

    /// Member ids, in order.
    pub fn ids(&self) -> &[String] {
        match self {
            Pair::Stereo(ids) => ids,
            Pair::Triplet(ids) => ids,
        }
    }

    /// Number of members (2 or 3).
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    /// Always false; pairs have at least two members.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// First and second member.
    pub fn left_right(&self) -> (&str, &str) {
        let ids = self.ids();
        (&ids[0], &ids[1])
    }

    /// `_`-joined ids, used as the fragment directory name.
    pub fn stem(&self) -> String {
        self.ids().join("_")
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ids().join(" - "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_ids_accepts_two_or_three() {
        assert_eq!(Pair::from_ids(ids(&["a", "b"])), Some(Pair::stereo("a", "b")));
        assert_eq!(
            Pair::from_ids(ids(&["a", "b", "c"])),
            Some(Pair::triplet("a", "b", "c"))
        );
        assert_eq!(Pair::from_ids(ids(&["a"])), None);
        assert_eq!(Pair::from_ids(ids(&["a", "b", "c", "d"])), None);
    }

    #[test]
    fn stem_joins_with_underscore() {
        assert_eq!(Pair::stereo("20200101", "20200315").stem(), "20200101_20200315");
        assert_eq!(Pair::triplet("a", "b", "c").stem(), "a_b_c");
    }

    #[test]
    fn display_lists_members() {
        assert_eq!(Pair::triplet("a", "b", "c").to_string(), "a - b - c");
    }

    #[test]
    fn serializes_as_plain_list() {
        let json = serde_json::to_string(&Pair::stereo("a", "b")).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }
}
