//! Newtype wrappers for arena indices.
//!
//! These give compile-time separation between box handles and the line
//! references used by the footnote bookkeeping.

use std::fmt;

/// Handle of a box inside a `BoxTree` arena.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BoxId(u32);

impl BoxId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one line box: the block that owns it and its index in the
/// block's line list. Lines are rebuilt wholesale on relayout, so a
/// `LineRef` is only meaningful for the current layout attempt of `block`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct LineRef {
    pub block: BoxId,
    pub index: usize,
}

impl LineRef {
    pub fn new(block: BoxId, index: usize) -> Self {
        Self { block, index }
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:line{}", self.block, self.index)
    }
}
