use crate::algorithms::floats::{BoxOffset, FloatContainer};
use crate::algorithms::footnotes::FootnoteManager;
use crate::algorithms::pagination::PageSequence;
use crate::cache::MeasureCache;
use crate::config::LayoutConfig;
use crate::perf::LayoutStats;
use crate::state::{Bfc, LayoutState, PendingMarker, StyleTracker};
use crate::style::ComputedStyle;
use crate::tree::BoxTree;
use flowbox_style::display::{Clear, Float};
use flowbox_style::stylesheet::{ElementStyle, PageMasters};
use flowbox_traits::{BidiSplitter, FontMetrics, TextBoundary, TextMeasurer};
use flowbox_types::geometry::EPSILON;
use flowbox_types::{BoxId, Point};
use std::sync::Arc;

// --- Services ---

/// The text services a layout run consumes.
#[derive(Debug, Clone)]
pub struct LayoutServices {
    pub measurer: Arc<dyn TextMeasurer>,
    pub boundary: Arc<dyn TextBoundary>,
    /// Without a splitter every text node is treated as one left-to-right run.
    pub bidi: Option<Arc<dyn BidiSplitter>>,
}

/// Whether `page-break-inside: avoid` is still honoured below the current box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepTogetherPolicy {
    #[default]
    Allow,
    Deny,
}

/// An absolutely or fixed positioned box waiting for its containing block
/// to finish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingAbsolute {
    pub id: BoxId,
    pub containing_block: BoxId,
    /// Where the box would have been in normal flow, in document coordinates.
    pub static_position: Point,
}

// --- Context ---

/// Everything mutable during one layout run.
///
/// Node layout functions take the context explicitly; nothing lives in
/// globals. The run state behind `capture_state`/`restore_state` is private
/// so that every change goes through a method that bumps the generation.
pub struct LayoutContext<'a> {
    pub tree: &'a mut BoxTree,
    pub services: &'a LayoutServices,
    pub config: LayoutConfig,
    pub pages: PageSequence,
    pub footnotes: FootnoteManager,
    pub stats: LayoutStats,
    pub keep_policy: KeepTogetherPolicy,
    pub(crate) cache: MeasureCache,

    bfc_stack: Vec<Bfc>,
    pending_marker: Option<PendingMarker>,
    first_line: StyleTracker,
    first_letter: StyleTracker,
    page_name: Option<Arc<str>>,
    extra_top: f32,
    extra_bottom: f32,
    no_page_break: usize,
    absolutes: Vec<PendingAbsolute>,

    generation: u64,
    next_generation: u64,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        tree: &'a mut BoxTree,
        services: &'a LayoutServices,
        config: LayoutConfig,
        masters: Arc<PageMasters>,
        first_page_name: Option<Arc<str>>,
    ) -> Self {
        let pages = PageSequence::new(masters, config.page_lookback, first_page_name.clone());
        Self {
            tree,
            services,
            config,
            pages,
            footnotes: FootnoteManager::new(config.min_footnote_lines),
            stats: LayoutStats::default(),
            keep_policy: KeepTogetherPolicy::Allow,
            cache: MeasureCache::new(config.cache_capacity),
            bfc_stack: Vec::new(),
            pending_marker: None,
            first_line: StyleTracker::default(),
            first_letter: StyleTracker::default(),
            page_name: first_page_name,
            extra_top: 0.0,
            extra_bottom: 0.0,
            no_page_break: 0,
            absolutes: Vec::new(),
            generation: 0,
            next_generation: 1,
        }
    }

    fn touch(&mut self) {
        self.generation = self.next_generation;
        self.next_generation += 1;
    }

    // --- Checkpoints ---

    pub fn capture_state(&self) -> LayoutState {
        LayoutState {
            bfc_stack: self.bfc_stack.clone(),
            pending_marker: self.pending_marker.clone(),
            first_line: self.first_line.clone(),
            first_letter: self.first_letter.clone(),
            page_name: self.page_name.clone(),
            extra_top: self.extra_top,
            extra_bottom: self.extra_bottom,
            no_page_break: self.no_page_break,
            absolutes: self.absolutes.len(),
            generation: self.generation,
        }
    }

    /// Puts the run state back to `state`. A no-op when nothing changed
    /// since the snapshot was taken.
    pub fn restore_state(&mut self, state: &LayoutState) {
        if self.generation == state.generation {
            return;
        }
        self.bfc_stack = state.bfc_stack.clone();
        self.pending_marker = state.pending_marker.clone();
        self.first_line = state.first_line.clone();
        self.first_letter = state.first_letter.clone();
        self.page_name = state.page_name.clone();
        self.extra_top = state.extra_top;
        self.extra_bottom = state.extra_bottom;
        self.no_page_break = state.no_page_break;
        self.absolutes.truncate(state.absolutes);
        self.generation = state.generation;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Undoes a layout attempt of `roots`: run state, footnotes called from
    /// inside them, their geometry, and pages created since `page_count`.
    pub fn discard_attempt(&mut self, roots: &[BoxId], state: &LayoutState, page_count: usize) {
        self.restore_state(state);
        let tree = &*self.tree;
        self.footnotes.remove_owned_by(&mut self.pages, |owner| {
            roots.iter().any(|root| tree.is_within(owner.block, *root))
        });
        for root in roots {
            self.tree.reset_subtree(*root);
        }
        self.trim_pages(page_count);
    }

    /// Hands back the page list, footnote areas and counters once layout
    /// is complete.
    pub fn finish(self) -> (PageSequence, FootnoteManager, LayoutStats) {
        (self.pages, self.footnotes, self.stats)
    }

    pub fn trim_pages(&mut self, count: usize) {
        self.footnotes.forget_pages_from(count.max(1));
        let removed = self.pages.trim(count);
        self.stats.pages_trimmed += removed;
    }

    // --- Pagination ---

    /// Whether page breaks are checked at all at this point.
    pub fn paginating(&self) -> bool {
        self.config.paginate && self.no_page_break == 0
    }

    pub fn enter_no_page_break(&mut self) {
        self.no_page_break += 1;
        self.touch();
    }

    pub fn exit_no_page_break(&mut self) {
        self.no_page_break = self.no_page_break.saturating_sub(1);
        self.touch();
    }

    pub fn page_name(&self) -> Option<Arc<str>> {
        self.page_name.clone()
    }

    pub fn set_page_name(&mut self, name: Option<Arc<str>>) {
        if self.page_name != name {
            self.page_name = name;
            self.touch();
        }
    }

    pub fn extra_top(&self) -> f32 {
        self.extra_top
    }

    pub fn extra_bottom(&self) -> f32 {
        self.extra_bottom
    }

    pub fn set_extra_space(&mut self, top: f32, bottom: f32) {
        if self.extra_top != top || self.extra_bottom != bottom {
            self.extra_top = top;
            self.extra_bottom = bottom;
            self.touch();
        }
    }

    /// Index of the page containing `y`, creating pages as needed. Without
    /// pagination everything lives on the first page.
    pub fn page_index(&mut self, y: f32) -> usize {
        if !self.config.paginate {
            return 0;
        }
        let name = self.page_name.clone();
        self.pages.get_page(y, name)
    }

    /// Whether `[top, bottom)` runs past the usable bottom of its page.
    pub fn crosses(&mut self, top: f32, bottom: f32) -> bool {
        self.paginating() && self.pages.crosses_page_break(top, bottom, self.extra_bottom)
    }

    /// First flow position on the page after the one containing `y`.
    pub fn next_page_top(&mut self, y: f32) -> f32 {
        let name = self.page_name.clone();
        self.pages.next_page_top(y, name) + self.extra_top
    }

    /// Whether `y` is the first flow position of its page.
    pub fn is_at_page_top(&mut self, y: f32) -> bool {
        let index = self.page_index(y);
        self.pages
            .page(index)
            .is_some_and(|p| (y - p.top - self.extra_top).abs() < 0.1)
    }

    /// Whether the page containing `y` has no room left for flow content,
    /// as when footnotes continued from an earlier page claim all of it.
    pub fn is_page_full(&mut self, y: f32) -> bool {
        let index = self.page_index(y);
        let (top, bottom) = (self.extra_top, self.extra_bottom);
        self.pages
            .page(index)
            .is_some_and(|p| p.footnote_reserved > 0.0 && p.flow_bottom() - bottom <= p.top + top + EPSILON)
    }

    // --- Block formatting contexts ---

    pub fn push_bfc(&mut self, owner: BoxId, origin: Point) {
        self.bfc_stack.push(Bfc::new(owner, origin));
        self.touch();
    }

    pub fn pop_bfc(&mut self) -> Option<Bfc> {
        let bfc = self.bfc_stack.pop();
        self.touch();
        bfc
    }

    pub fn bfc(&self) -> Option<&Bfc> {
        self.bfc_stack.last()
    }

    /// Places a float whose margin box is `size` wide and tall, no higher
    /// than document offset `y`, inside `[left, left + width)`. Returns the
    /// margin box in document coordinates.
    #[allow(clippy::too_many_arguments)]
    pub fn place_float(
        &mut self,
        id: BoxId,
        side: Float,
        clear: Clear,
        width: f32,
        height: f32,
        y: f32,
        left: f32,
        container_width: f32,
    ) -> BoxOffset {
        self.stats.floats_placed += 1;
        let Some(bfc) = self.bfc_stack.last_mut() else {
            return BoxOffset {
                box_id: id,
                x: left,
                y,
                width,
                height,
            };
        };
        let origin = bfc.origin;
        let container = FloatContainer::new(left - origin.x, container_width);
        let placed =
            bfc.floats
                .place_float(id, side, clear, width, height, y - origin.y, container);
        self.touch();
        BoxOffset {
            x: placed.x + origin.x,
            y: placed.y + origin.y,
            ..placed
        }
    }

    pub fn remove_float(&mut self, id: BoxId) {
        if let Some(bfc) = self.bfc_stack.last_mut() {
            bfc.floats.remove_float(id);
            self.touch();
        }
    }

    /// Float intrusion into the line band `[y, y + height)` whose edges are
    /// at document x `left` and `right`: how much is taken from each side.
    pub fn float_intrusions(&self, y: f32, height: f32, left: f32, right: f32) -> (f32, f32) {
        match self.bfc() {
            Some(bfc) => {
                let by = y - bfc.origin.y;
                (
                    bfc.floats.left_distance(by, height, left - bfc.origin.x),
                    bfc.floats.right_distance(by, height, right - bfc.origin.x),
                )
            }
            None => (0.0, 0.0),
        }
    }

    pub fn next_line_delta(&self, y: f32) -> f32 {
        self.bfc()
            .map_or(0.0, |bfc| bfc.floats.next_line_delta(y - bfc.origin.y))
    }

    pub fn clear_delta(&self, y: f32, clear: Clear) -> f32 {
        if clear == Clear::None {
            return 0.0;
        }
        self.bfc()
            .map_or(0.0, |bfc| bfc.floats.clear_delta(y - bfc.origin.y, clear))
    }

    /// Document Y of the lowest float bottom in the current context.
    pub fn lowest_float_bottom(&self) -> Option<f32> {
        self.bfc()
            .filter(|bfc| !bfc.floats.is_empty())
            .map(|bfc| bfc.floats.lowest_float_bottom() + bfc.origin.y)
    }

    // --- Markers and pseudo-elements ---

    pub fn set_pending_marker(&mut self, marker: PendingMarker) {
        self.pending_marker = Some(marker);
        self.touch();
    }

    pub fn pending_marker(&self) -> Option<&PendingMarker> {
        self.pending_marker.as_ref()
    }

    pub fn take_pending_marker(&mut self) -> Option<PendingMarker> {
        let marker = self.pending_marker.take();
        if marker.is_some() {
            self.touch();
        }
        marker
    }

    pub fn push_pseudo_styles(
        &mut self,
        owner: BoxId,
        first_line: Option<Arc<ElementStyle>>,
        first_letter: Option<Arc<ElementStyle>>,
    ) {
        if first_line.is_none() && first_letter.is_none() {
            return;
        }
        if let Some(style) = first_line {
            self.first_line.push(owner, style);
        }
        if let Some(style) = first_letter {
            self.first_letter.push(owner, style);
        }
        self.touch();
    }

    /// Drops the pseudo-element declarations of `owner`, if no line has
    /// consumed them yet.
    pub fn pop_pseudo_styles(&mut self, owner: BoxId) {
        if self.first_line.is_empty() && self.first_letter.is_empty() {
            return;
        }
        self.first_line.remove_owner(owner);
        self.first_letter.remove_owner(owner);
        self.touch();
    }

    /// Hands the tracked pseudo styles to the first line being laid out;
    /// after this, no other line sees them.
    pub fn take_pseudo_styles(&mut self) -> (StyleTracker, StyleTracker) {
        if self.first_line.is_empty() && self.first_letter.is_empty() {
            return (StyleTracker::default(), StyleTracker::default());
        }
        let taken = (
            std::mem::take(&mut self.first_line),
            std::mem::take(&mut self.first_letter),
        );
        self.touch();
        taken
    }

    // --- Positioned boxes ---

    pub fn register_absolute(&mut self, entry: PendingAbsolute) {
        self.absolutes.push(entry);
        self.touch();
    }

    /// Removes and returns the boxes waiting for `containing_block`.
    pub fn take_absolutes_for(&mut self, containing_block: BoxId) -> Vec<PendingAbsolute> {
        if !self
            .absolutes
            .iter()
            .any(|a| a.containing_block == containing_block)
        {
            return Vec::new();
        }
        let (taken, kept) = std::mem::take(&mut self.absolutes)
            .into_iter()
            .partition(|a| a.containing_block == containing_block);
        self.absolutes = kept;
        self.touch();
        taken
    }

    /// Removes and returns every box still waiting.
    pub fn take_all_absolutes(&mut self) -> Vec<PendingAbsolute> {
        if self.absolutes.is_empty() {
            return Vec::new();
        }
        self.touch();
        std::mem::take(&mut self.absolutes)
    }

    // --- Text ---

    /// Width of `text` in `style`'s font, letter spacing included.
    pub fn measure_text(&mut self, style: &ComputedStyle, text: &str) -> f32 {
        self.cache.width(
            &*self.services.measurer,
            style.font(),
            style.text.letter_spacing,
            text,
            &mut self.stats,
        )
    }

    pub fn metrics(&self, style: &ComputedStyle) -> FontMetrics {
        self.services.measurer.metrics(style.font())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::get_default_style;
    use crate::text::{FixedPitchMeasurer, UnicodeBoundary};
    use flowbox_style::dimension::{Margins, PageSize};

    fn services() -> LayoutServices {
        LayoutServices {
            measurer: Arc::new(FixedPitchMeasurer::default()),
            boundary: Arc::new(UnicodeBoundary),
            bidi: None,
        }
    }

    fn masters() -> Arc<PageMasters> {
        Arc::new(PageMasters::single(
            PageSize::Custom {
                width: 300.0,
                height: 100.0,
            },
            Margins::all(0.0),
        ))
    }

    #[test]
    fn restore_undoes_float_placement() {
        let mut tree = BoxTree::new();
        let root = tree.add_block(get_default_style());
        let services = services();
        let mut ctx = LayoutContext::new(&mut tree, &services, LayoutConfig::default(), masters(), None);
        ctx.push_bfc(root, Point::new(0.0, 0.0));
        let snapshot = ctx.capture_state();
        ctx.place_float(BoxId::new(5), Float::Left, Clear::None, 100.0, 50.0, 0.0, 0.0, 300.0);
        assert_eq!(ctx.float_intrusions(10.0, 10.0, 0.0, 300.0), (100.0, 0.0));
        assert_ne!(ctx.capture_state(), snapshot);
        ctx.restore_state(&snapshot);
        assert_eq!(ctx.float_intrusions(10.0, 10.0, 0.0, 300.0), (0.0, 0.0));
        assert_eq!(ctx.capture_state(), snapshot);
    }

    #[test]
    fn restore_without_changes_is_skipped() {
        let mut tree = BoxTree::new();
        let services = services();
        let mut ctx = LayoutContext::new(&mut tree, &services, LayoutConfig::default(), masters(), None);
        let snapshot = ctx.capture_state();
        let generation = ctx.generation();
        ctx.restore_state(&snapshot);
        assert_eq!(ctx.generation(), generation);
        ctx.set_extra_space(10.0, 0.0);
        assert_ne!(ctx.generation(), generation);
        ctx.restore_state(&snapshot);
        assert_eq!(ctx.extra_top(), 0.0);
        assert_eq!(ctx.generation(), generation);
    }

    #[test]
    fn float_coordinates_follow_the_bfc_origin() {
        let mut tree = BoxTree::new();
        let root = tree.add_block(get_default_style());
        let services = services();
        let mut ctx = LayoutContext::new(&mut tree, &services, LayoutConfig::default(), masters(), None);
        ctx.push_bfc(root, Point::new(20.0, 200.0));
        let placed = ctx.place_float(BoxId::new(5), Float::Right, Clear::None, 50.0, 30.0, 210.0, 20.0, 200.0);
        assert_eq!((placed.x, placed.y), (170.0, 210.0));
        assert_eq!(ctx.float_intrusions(215.0, 10.0, 20.0, 220.0), (0.0, 50.0));
        assert_eq!(ctx.lowest_float_bottom(), Some(240.0));
    }

    #[test]
    fn next_page_top_includes_reserved_header_space() {
        let mut tree = BoxTree::new();
        let services = services();
        let mut ctx = LayoutContext::new(&mut tree, &services, LayoutConfig::default(), masters(), None);
        ctx.set_extra_space(15.0, 0.0);
        assert_eq!(ctx.next_page_top(30.0), 115.0);
        assert!(ctx.is_at_page_top(115.0));
    }
}
