//! Spring links between particles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Undirected spring between two particle indices, stored with `a < b`.
///
/// Deserialization rejects links that are not ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLink")]
pub struct Link {
    pub a: u32,
    pub b: u32,
}

/// Unchecked wire form of a [`Link`].
#[derive(Deserialize)]
struct RawLink {
    a: u32,
    b: u32,
}

impl TryFrom<RawLink> for Link {
    type Error = String;

    fn try_from(raw: RawLink) -> Result<Self, Self::Error> {
        if raw.a < raw.b {
            Ok(Self { a: raw.a, b: raw.b })
        } else {
            Err(format!("link ({}, {}) is not ordered", raw.a, raw.b))
        }
    }
}

impl Link {
    /// Create a link, panicking unless `a < b`.
    pub fn new(a: u32, b: u32) -> Self {
        assert!(a < b, "link invariant violated: ({a}, {b}) is not ordered");
        Self { a, b }
    }

    /// Link between `i` and `j` in either order. Returns `None` for self-links.
    pub fn between(i: u32, j: u32) -> Option<Self> {
        match i.cmp(&j) {
            std::cmp::Ordering::Less => Some(Self { a: i, b: j }),
            std::cmp::Ordering::Greater => Some(Self { a: j, b: i }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn as_array(&self) -> [u32; 2] {
        [self.a, self.b]
    }
}

/// Ordered set of links.
///
/// Iteration is in ascending `(a, b)` order, so passes that walk the links
/// visit them identically on every run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    links: BTreeSet<Link>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the link `(a, b)`. Returns `true` if it was not present.
    ///
    /// # Panics
    ///
    /// Panics unless `a < b`.
    pub fn insert(&mut self, a: u32, b: u32) -> bool {
        self.links.insert(Link::new(a, b))
    }

    pub fn contains(&self, a: u32, b: u32) -> bool {
        Link::between(a, b).is_some_and(|link| self.links.contains(&link))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Link> + '_ {
        self.links.iter().copied()
    }
}

impl<'a> IntoIterator for &'a LinkSet {
    type Item = Link;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, Link>>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains_either_order() {
        let mut links = LinkSet::new();
        assert!(links.insert(1, 4));
        assert!(!links.insert(1, 4));
        assert!(links.contains(4, 1));
        assert!(!links.contains(2, 2));
        assert_eq!(links.len(), 1);
    }

    #[test]
    #[should_panic(expected = "link invariant")]
    fn test_unordered_insert_panics() {
        LinkSet::new().insert(3, 2);
    }

    #[test]
    #[should_panic(expected = "link invariant")]
    fn test_self_link_panics() {
        Link::new(5, 5);
    }

    #[test]
    fn test_iteration_is_ordered() {
        let mut links = LinkSet::new();
        links.insert(2, 3);
        links.insert(0, 9);
        links.insert(0, 1);
        let order: Vec<_> = links.iter().map(|l| l.as_array()).collect();
        assert_eq!(order, vec![[0, 1], [0, 9], [2, 3]]);
        assert_eq!(Link::between(7, 3), Some(Link { a: 3, b: 7 }));
    }

    #[test]
    fn test_deserialize_rejects_unordered_links() {
        assert!(serde_json::from_str::<Link>(r#"{"a":3,"b":2}"#).is_err());
        assert!(serde_json::from_str::<Link>(r#"{"a":1,"b":1}"#).is_err());
        let ok: Link = serde_json::from_str(r#"{"a":2,"b":3}"#).unwrap();
        assert_eq!(ok, Link::new(2, 3));

        let bad = r#"{"links":[{"a":3,"b":2},{"a":1,"b":1}]}"#;
        assert!(serde_json::from_str::<LinkSet>(bad).is_err());
    }

    #[test]
    fn test_link_set_json_roundtrip() {
        let mut links = LinkSet::new();
        links.insert(0, 4);
        links.insert(2, 3);
        let json = serde_json::to_string(&links).unwrap();
        let parsed: LinkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, links);
    }
}
