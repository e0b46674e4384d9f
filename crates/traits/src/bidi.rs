use flowbox_style::Direction;
use std::fmt::Debug;

/// A maximal run of uniform direction inside a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidiRun {
    /// Byte offset into the paragraph text.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
    pub direction: Direction,
}

impl BidiRun {
    pub fn new(start: usize, len: usize, direction: Direction) -> Self {
        Self { start, len, direction }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Splits a paragraph into directional runs.
///
/// Runs are returned in logical order and cover the paragraph without gaps.
pub trait BidiSplitter: Send + Sync + Debug {
    fn split(&self, paragraph: &str, base: Direction) -> Vec<BidiRun>;
}
