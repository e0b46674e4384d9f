//! Checkpoints of the run-wide layout state.
//!
//! Everything a child's layout attempt may change outside its own subtree
//! is captured here, so that an abandoned attempt can be undone exactly.
//! Footnote bodies and trailing pages are not part of the snapshot: they are
//! released by owner and trimmed by count instead.

use crate::algorithms::floats::FloatManager;
use crate::style::{ComputedStyle, apply_pseudo_style};
use flowbox_style::stylesheet::ElementStyle;
use flowbox_types::{BoxId, Point};
use std::sync::Arc;

/// One block formatting context: the box establishing it, the document
/// position its float coordinates are relative to, and its floats.
#[derive(Debug, Clone, PartialEq)]
pub struct Bfc {
    pub owner: BoxId,
    pub origin: Point,
    pub floats: FloatManager,
}

impl Bfc {
    pub fn new(owner: BoxId, origin: Point) -> Self {
        Self {
            owner,
            origin,
            floats: FloatManager::new(),
        }
    }
}

/// List marker waiting to be attached to the first line laid out below
/// its list item.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMarker {
    pub owner: BoxId,
    pub text: Arc<str>,
    pub inside: bool,
    pub style: Arc<ComputedStyle>,
}

/// Pseudo-element declarations of the enclosing blocks, outermost first.
///
/// A block's `::first-line` applies to the first line of its first
/// descendant line box, so the declarations travel down the tree until a
/// line consumes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleTracker {
    entries: Vec<(BoxId, Arc<ElementStyle>)>,
}

impl StyleTracker {
    pub fn push(&mut self, owner: BoxId, style: Arc<ElementStyle>) {
        self.entries.push((owner, style));
    }

    pub fn remove_owner(&mut self, owner: BoxId) {
        self.entries.retain(|(id, _)| *id != owner);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `base` with every tracked declaration applied, outermost first.
    pub fn derive(&self, base: &Arc<ComputedStyle>) -> Arc<ComputedStyle> {
        self.entries
            .iter()
            .fold(base.clone(), |style, (_, pseudo)| apply_pseudo_style(&style, pseudo))
    }
}

/// An immutable snapshot of the layout run state.
///
/// Two snapshots compare equal when the state they describe is the same;
/// the generation only says whether anything was touched in between.
#[derive(Debug, Clone)]
pub struct LayoutState {
    pub(crate) bfc_stack: Vec<Bfc>,
    pub(crate) pending_marker: Option<PendingMarker>,
    pub(crate) first_line: StyleTracker,
    pub(crate) first_letter: StyleTracker,
    pub(crate) page_name: Option<Arc<str>>,
    pub(crate) extra_top: f32,
    pub(crate) extra_bottom: f32,
    pub(crate) no_page_break: usize,
    pub(crate) absolutes: usize,
    pub(crate) generation: u64,
}

impl LayoutState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_name(&self) -> Option<&str> {
        self.page_name.as_deref()
    }

    pub fn extra_top(&self) -> f32 {
        self.extra_top
    }

    pub fn extra_bottom(&self) -> f32 {
        self.extra_bottom
    }
}

impl PartialEq for LayoutState {
    fn eq(&self, other: &Self) -> bool {
        self.bfc_stack == other.bfc_stack
            && self.pending_marker == other.pending_marker
            && self.first_line == other.first_line
            && self.first_letter == other.first_letter
            && self.page_name == other.page_name
            && self.extra_top == other.extra_top
            && self.extra_bottom == other.extra_bottom
            && self.no_page_break == other.no_page_break
            && self.absolutes == other.absolutes
    }
}
