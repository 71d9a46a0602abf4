// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifier: a dotted path `S-<timestamp>.P-<n>.JG-<n>.J-<n>` (§3).
//!
//! Each segment is `{prefix}-{n}` where prefix is one of `S`, `P`, `JG`, `J`
//! and `n` is the first unused sibling index under the parent. Splitting on
//! `.` yields the ancestor chain, which the parameter cache and the factory
//! both rely on.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

pub const DELIM: char = '.';
pub const SUBDELIM: char = '-';

/// Dotted-path entity identifier. Cheap to clone (`SmolStr` is
/// inline-stored for short ids, which covers all but very deep trees).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(SmolStr);

impl EntityId {
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Split into the dotted segment chain, root first.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split(DELIM).collect()
    }

    /// The id of this entity's parent, or `None` if this is a root (no dot).
    pub fn parent(&self) -> Option<EntityId> {
        let mut segs = self.segments();
        if segs.len() <= 1 {
            return None;
        }
        segs.pop();
        Some(EntityId::new(segs.join(&DELIM.to_string())))
    }

    /// All proper ancestors, nearest first (immediate parent, then
    /// grandparent, ... up to but excluding the root's own id being
    /// duplicated).
    pub fn ancestors(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut cur = self.clone();
        while let Some(p) = cur.parent() {
            out.push(p.clone());
            cur = p;
        }
        out
    }

    /// Build the child id for the next unused sibling index with the given
    /// prefix, given the set of already-allocated direct child ids.
    pub fn next_child(&self, prefix: &str, existing: impl Iterator<Item = EntityId>) -> EntityId {
        let existing: std::collections::HashSet<EntityId> = existing.collect();
        let mut n: u32 = 1;
        loop {
            let candidate =
                EntityId::new(format!("{}{}{}{}{}", self.0, DELIM, prefix, SUBDELIM, n));
            if !existing.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// True iff `other` is this id or a descendant of it.
    pub fn is_ancestor_of(&self, other: &EntityId) -> bool {
        other.0.as_str() == self.0.as_str()
            || other.0.as_str().starts_with(&format!("{}{}", self.0, DELIM))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::new(s)
    }
}

impl std::borrow::Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
