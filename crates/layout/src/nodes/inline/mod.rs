//! Inline formatting: breaks a block's inline content into line boxes.
//!
//! Items are consumed left to right. Each line is built until something no
//! longer fits, then committed: aligned vertically, moved to the next page
//! if it crosses a page break, given its footnotes, placed horizontally, and
//! stored on the block. Floats met mid-line are placed once the line is done.

pub mod horizontal;
pub mod items;
pub mod line_box;
pub mod vertical;

pub use line_box::{FragmentKind, InlineFragment, LineBox};

use self::horizontal::{LineWindow, place_fragments, reorder};
use self::items::{InlineItem, collect_items, split_first_letter};
use super::positioned::{containing_block, layout_atomic_inline, layout_float, layout_footnote_body};
use crate::LayoutError;
use crate::interface::{LayoutContext, PendingAbsolute};
use crate::state::{PendingMarker, StyleTracker};
use crate::style::ComputedStyle;
use crate::text::{BreakOptions, LineBreakContext, RetryGuard, break_text};
use crate::util::exceeds;
use flowbox_style::text::Direction;
use flowbox_types::{BoxId, LineRef, Point};
use std::sync::Arc;

/// The line being built.
#[derive(Debug, Default)]
struct LineState {
    /// Document Y of the line top.
    top: f32,
    window_left: f32,
    window_width: f32,
    start_reserve: f32,
    fragments: Vec<InlineFragment>,
    /// Advance of the fragments so far.
    width: f32,
    has_content: bool,
    /// Hanging trailing space of the last text fragment: its index and width.
    trailing: Option<(usize, f32)>,
    footnotes: Vec<BoxId>,
    pending_floats: Vec<BoxId>,
    /// Atomic boxes on this line with the provisional position of their
    /// margin box.
    atomics: Vec<(BoxId, Point)>,
    /// The line was moved down to a new page before it got any content.
    moved: bool,
    /// The page-break check for the line's current top has been done.
    checked: bool,
}

impl LineState {
    fn available(&self) -> f32 {
        (self.window_width - self.start_reserve).max(0.0)
    }

    fn remaining(&self) -> f32 {
        self.available() - self.width
    }

    fn push(&mut self, fragment: InlineFragment) {
        self.width += fragment.width;
        if !matches!(fragment.kind, FragmentKind::End) {
            self.trailing = None;
        }
        self.fragments.push(fragment);
    }
}

struct InlineFlow {
    block: BoxId,
    style: Arc<ComputedStyle>,
    origin: Point,
    width: f32,
    first_line: StyleTracker,
    first_letter: StyleTracker,
    marker: Option<PendingMarker>,
    marker_width: f32,
    lines: Vec<LineBox>,
    line: LineState,
    /// Document Y below the last committed line.
    cursor: f32,
}

/// Lays out the inline content of `block` into line boxes stored on the
/// block. Returns the height of the lines.
pub fn layout_inline_content(ctx: &mut LayoutContext, block: BoxId) -> Result<f32, LayoutError> {
    let style = ctx.tree.style(block)?;
    let geometry = ctx.tree.geometry(block)?;
    let origin = geometry.content_origin();

    let (first_line, first_letter) = ctx.take_pseudo_styles();
    let marker = ctx.take_pending_marker();
    let marker_width = match &marker {
        Some(m) => ctx.measure_text(&m.style, &m.text),
        None => 0.0,
    };

    let mut items = collect_items(ctx, block)?;
    if !first_letter.is_empty() {
        let boundary = ctx.services.boundary.clone();
        split_first_letter(&mut items, &*boundary);
    }

    let mut flow = InlineFlow {
        block,
        style,
        origin,
        width: geometry.content_width,
        first_line,
        first_letter,
        marker,
        marker_width,
        lines: Vec::new(),
        line: LineState::default(),
        cursor: origin.y,
    };
    flow.start_line(ctx, origin.y);
    flow.run(ctx, &items)?;

    let height = if flow.lines.is_empty() { 0.0 } else { flow.cursor - origin.y };
    ctx.tree.get_mut(block)?.lines = flow.lines;
    Ok(height)
}

impl InlineFlow {
    fn strut(&self) -> f32 {
        self.style.text.line_height
    }

    fn is_first_line(&self) -> bool {
        self.lines.is_empty()
    }

    /// Style an item is set in on the current line.
    fn line_style(&self, style: &Arc<ComputedStyle>, first_letter: bool) -> Arc<ComputedStyle> {
        let mut derived = style.clone();
        if self.is_first_line() && !self.first_line.is_empty() {
            derived = self.first_line.derive(&derived);
        }
        if first_letter {
            derived = self.first_letter.derive(&derived);
        }
        derived
    }

    /// Begins a new line at document Y `top`.
    fn start_line(&mut self, ctx: &mut LayoutContext, top: f32) {
        self.line = LineState {
            top,
            ..LineState::default()
        };
        self.refresh_window(ctx);
    }

    /// Moves a line that would cross a page break with its strut to the
    /// next page. Done once per line top, just before content is placed, so
    /// that finishing a block never creates a page nothing lands on.
    fn prepare_line(&mut self, ctx: &mut LayoutContext) {
        if self.line.checked {
            return;
        }
        self.line.checked = true;
        let mut top = self.line.top;
        while ctx.crosses(top, top + self.strut()) && (!ctx.is_at_page_top(top) || ctx.is_page_full(top)) {
            top = ctx.next_page_top(top);
            self.line.moved = true;
        }
        if top != self.line.top {
            self.line.top = top;
            self.refresh_window(ctx);
        }
    }

    /// Recomputes the line's width after its top changed or a float was
    /// placed.
    fn refresh_window(&mut self, ctx: &mut LayoutContext) {
        let strut = self.strut();
        let (left, right) = ctx.float_intrusions(self.line.top, strut, self.origin.x, self.origin.x + self.width);
        self.line.window_left = left;
        self.line.window_width = (self.width - left - right).max(0.0);
        self.line.start_reserve = if self.is_first_line() {
            let marker = match &self.marker {
                Some(m) if m.inside => self.marker_width,
                _ => 0.0,
            };
            self.style.text.text_indent + marker
        } else {
            0.0
        };
    }

    /// Moves the empty line below the floats in its way. Returns false when
    /// no float is in the way.
    fn shift_below_floats(&mut self, ctx: &mut LayoutContext) -> bool {
        let delta = ctx.next_line_delta(self.line.top);
        if delta <= 0.0 {
            return false;
        }
        self.line.top += delta;
        self.line.checked = false;
        self.refresh_window(ctx);
        self.prepare_line(ctx);
        true
    }

    fn run(&mut self, ctx: &mut LayoutContext, items: &[InlineItem]) -> Result<(), LayoutError> {
        let mut guard = RetryGuard::new(ctx.config.max_line_retries);
        let mut breaker: Option<LineBreakContext> = None;
        let mut index = 0;

        while index < items.len() {
            self.prepare_line(ctx);
            match &items[index] {
                InlineItem::Text {
                    id,
                    text,
                    offset,
                    direction,
                    style,
                    first_letter,
                } => {
                    let cursor = breaker.get_or_insert_with(|| LineBreakContext::new(text.clone()));
                    if cursor.is_finished() {
                        breaker = None;
                        index += 1;
                        continue;
                    }
                    let style = self.line_style(style, *first_letter);
                    let force_output = guard.must_force(index, cursor.start);
                    if force_output {
                        ctx.stats.forced_line_outputs += 1;
                        log::warn!(
                            "Forcing text of {} onto the line at offset {} after {} retries",
                            id,
                            cursor.start,
                            guard.retries(index, cursor.start)
                        );
                    }
                    let options = BreakOptions {
                        line_is_empty: !self.line.has_content,
                        force_output,
                    };
                    let boundary = ctx.services.boundary.clone();
                    let remaining = self.line.remaining();
                    break_text(
                        cursor,
                        remaining,
                        &style,
                        &mut |s: &str| ctx.measure_text(&style, s),
                        &*boundary,
                        options,
                    );

                    if cursor.unbreakable && !options.force_output {
                        if self.line.has_content {
                            guard.record_retry(index, cursor.start);
                            self.commit_line(ctx, false, false)?;
                            continue;
                        }
                        if self.shift_below_floats(ctx) {
                            guard.record_retry(index, cursor.start);
                            continue;
                        }
                        // Nothing left to try: the word overflows.
                    }

                    if cursor.end == cursor.start {
                        if cursor.needs_new_line {
                            guard.record_retry(index, cursor.start);
                            if self.line.has_content {
                                self.commit_line(ctx, false, false)?;
                            } else {
                                self.shift_below_floats(ctx);
                            }
                            continue;
                        }
                        breaker = None;
                        index += 1;
                        continue;
                    }

                    let fragment = self.text_fragment(ctx, *id, cursor, *offset, *direction, style);
                    let finished = cursor.is_finished();
                    let ends_on_nl = cursor.ends_on_nl;
                    cursor.advance();
                    if finished {
                        breaker = None;
                        index += 1;
                    }
                    if let Some((fragment, hang)) = fragment {
                        self.line.push(fragment);
                        if let Some(hang) = hang {
                            self.line.trailing = Some((self.line.fragments.len() - 1, hang));
                        }
                        self.line.has_content = true;
                    }
                    if ends_on_nl {
                        self.commit_line(ctx, true, false)?;
                    } else if !finished {
                        self.commit_line(ctx, false, false)?;
                    }
                }
                InlineItem::Start { id, edge, style } | InlineItem::End { id, edge, style } => {
                    let kind = if matches!(items[index], InlineItem::Start { .. }) {
                        FragmentKind::Start
                    } else {
                        FragmentKind::End
                    };
                    let style = self.line_style(style, false);
                    self.line
                        .push(InlineFragment::new(*id, kind, *edge, style.text.direction, style));
                    index += 1;
                }
                InlineItem::Atomic { id } => {
                    let top = self.line.top;
                    let (width, height) = layout_atomic_inline(ctx, *id, 0.0, top, self.width)?;
                    if self.line.has_content && exceeds(width, self.line.remaining()) {
                        self.commit_line(ctx, false, false)?;
                        continue;
                    }
                    let style = ctx.tree.style(*id)?;
                    let mut fragment =
                        InlineFragment::new(*id, FragmentKind::Atomic, width, style.text.direction, style);
                    fragment.height = height;
                    self.line.push(fragment);
                    self.line.atomics.push((*id, Point::new(0.0, top)));
                    self.line.has_content = true;
                    index += 1;
                }
                InlineItem::Float { id } => {
                    if !self.line.has_content && self.line.pending_floats.is_empty() {
                        layout_float(ctx, *id, self.origin, self.width, self.line.top)?;
                        self.refresh_window(ctx);
                    } else {
                        self.line.pending_floats.push(*id);
                    }
                    index += 1;
                }
                InlineItem::Absolute { id } => {
                    let static_x = self.origin.x + self.line.window_left + self.line.start_reserve + self.line.width;
                    ctx.register_absolute(PendingAbsolute {
                        id: *id,
                        containing_block: containing_block(ctx.tree, *id),
                        static_position: Point::new(static_x, self.line.top),
                    });
                    index += 1;
                }
                InlineItem::LineBreak { id, style } => {
                    let style = self.line_style(style, false);
                    self.line.push(InlineFragment::new(
                        *id,
                        FragmentKind::LineBreak,
                        0.0,
                        style.text.direction,
                        style,
                    ));
                    index += 1;
                    self.commit_line(ctx, true, false)?;
                }
                InlineItem::FootnoteCall { body, text, style } => {
                    let style = self.line_style(style, false);
                    let width = ctx.measure_text(&style, text);
                    if self.line.has_content && exceeds(width, self.line.remaining()) {
                        self.commit_line(ctx, false, false)?;
                        continue;
                    }
                    self.line.push(InlineFragment::new(
                        *body,
                        FragmentKind::FootnoteCall { text: text.clone() },
                        width,
                        style.text.direction,
                        style,
                    ));
                    self.line.footnotes.push(*body);
                    self.line.has_content = true;
                    index += 1;
                }
            }
        }

        if !self.line.fragments.is_empty() {
            self.commit_line(ctx, false, true)?;
        } else {
            self.place_pending_floats(ctx, self.line.top)?;
        }
        Ok(())
    }

    /// Builds the fragment for the span just chosen by the line breaker.
    /// Collapsible trailing spaces are reported with their hanging width,
    /// which may be zero.
    fn text_fragment(
        &self,
        ctx: &mut LayoutContext,
        id: BoxId,
        cursor: &LineBreakContext,
        offset: usize,
        direction: Direction,
        style: Arc<ComputedStyle>,
    ) -> Option<(InlineFragment, Option<f32>)> {
        let mut span = cursor.span();
        let mut end = cursor.end;
        if cursor.ends_on_nl {
            span = span.strip_suffix('\n').unwrap_or(span);
            end = cursor.start + span.len();
        }
        let shown: String = span.chars().filter(|c| *c != '\u{AD}').collect();
        if shown.is_empty() && !cursor.ends_on_soft_hyphen {
            return None;
        }
        let trailing_spaces = shown.len() - shown.trim_end_matches(' ').len();
        let (width, hang) = if cursor.ends_on_soft_hyphen || !style.text.white_space.collapses_spaces() {
            (cursor.width, None)
        } else {
            let full = ctx.measure_text(&style, &shown);
            let hang = (full - cursor.width).max(0.0);
            (full, (trailing_spaces > 0).then_some(hang))
        };
        let fragment = InlineFragment::new(
            id,
            FragmentKind::Text {
                text: Arc::from(shown.as_str()),
                start: offset + cursor.start,
                end: offset + end,
                hyphenated: cursor.ends_on_soft_hyphen,
            },
            width,
            direction,
            style,
        );
        Some((fragment, hang))
    }

    fn add_footnotes(&self, ctx: &mut LayoutContext, bodies: &[BoxId], owner: LineRef, top: f32) -> Result<(), LayoutError> {
        let page = ctx.page_index(top);
        for body in bodies {
            let height = layout_footnote_body(ctx, *body, page)?;
            let pages = &mut ctx.pages;
            ctx.footnotes
                .add_footnote_body(pages, page, *body, height, owner, self.strut());
            ctx.stats.footnotes_added += 1;
        }
        Ok(())
    }

    fn commit_line(&mut self, ctx: &mut LayoutContext, forced_break: bool, last: bool) -> Result<(), LayoutError> {
        let mut line = std::mem::take(&mut self.line);
        let first = self.is_first_line();

        if let Some((index, hang)) = line.trailing.take() {
            if let Some(fragment) = line.fragments.get_mut(index) {
                fragment.width -= hang;
                if let FragmentKind::Text { text, end, .. } = &mut fragment.kind {
                    let trimmed: Arc<str> = Arc::from(text.trim_end_matches(' '));
                    *end -= text.len() - trimmed.len();
                    *text = trimmed;
                }
            }
            line.width -= hang;
        }

        if first {
            if let Some(marker) = self.marker.take() {
                let width = self.marker_width;
                let fragment = InlineFragment::new(
                    marker.owner,
                    FragmentKind::Marker {
                        text: marker.text.clone(),
                        inside: marker.inside,
                    },
                    width,
                    self.style.text.direction,
                    marker.style.clone(),
                );
                line.fragments.insert(0, fragment);
            }
        }

        let metrics = vertical::align_line(ctx, &self.style, &mut line.fragments);
        let height = metrics.height;

        let mut top = line.top;
        let mut moved = line.moved;
        if ctx.crosses(top, top + height) && !ctx.is_at_page_top(top) {
            top = ctx.next_page_top(top);
            moved = true;
        }

        let line_index = self.lines.len();
        if !line.footnotes.is_empty() {
            let owner = LineRef::new(self.block, line_index);
            self.add_footnotes(ctx, &line.footnotes, owner, top)?;
            // The reservation may leave no room for the line itself.
            if ctx.crosses(top, top + height) && !ctx.is_at_page_top(top) {
                log::debug!("Footnotes of line {} of {} push it to the next page", line_index, self.block);
                let pages = &mut ctx.pages;
                ctx.footnotes.remove_footnote_bodies(pages, &line.footnotes, owner);
                top = ctx.next_page_top(top);
                moved = true;
                self.add_footnotes(ctx, &line.footnotes, owner, top)?;
            }
        }

        if moved && first && self.style.top_decoration() > 0.0 {
            ctx.tree.get_mut(self.block)?.needs_page_clear = true;
        }

        let (mut markers, mut flow): (Vec<_>, Vec<_>) = line
            .fragments
            .into_iter()
            .partition(|f| matches!(f.kind, FragmentKind::Marker { .. }));
        let direction = self.style.text.direction;
        reorder(&mut flow, direction);
        let window = LineWindow {
            left: line.window_left,
            width: line.window_width,
            start_reserve: line.start_reserve,
            direction,
            align: self.style.resolved_text_align(),
            justify: !last && !forced_break,
        };
        let content_width = place_fragments(&mut flow, &window);
        for marker in &mut markers {
            let inside = matches!(marker.kind, FragmentKind::Marker { inside: true, .. });
            let indent = self.style.text.text_indent;
            marker.x = match (direction.is_rtl(), inside) {
                (false, true) => line.window_left + indent,
                (false, false) => line.window_left - marker.width,
                (true, true) => line.window_left + line.window_width - indent - marker.width,
                (true, false) => line.window_left + line.window_width,
            };
        }

        for fragment in &flow {
            if !matches!(fragment.kind, FragmentKind::Atomic) {
                continue;
            }
            let Some((_, provisional)) = line.atomics.iter().find(|(id, _)| *id == fragment.box_id) else {
                continue;
            };
            let target = Point::new(self.origin.x + fragment.x, top + fragment.y);
            ctx.tree
                .translate_subtree(fragment.box_id, target.x - provisional.x, target.y - provisional.y);
            let g = &mut ctx.tree.get_mut(fragment.box_id)?.geometry;
            g.x = g.abs_x - self.origin.x;
            g.y = g.abs_y - self.origin.y;
        }

        markers.extend(flow);
        log::trace!(
            "Line {} of {} at {:.2}: height {:.2}, {} fragments",
            line_index,
            self.block,
            top,
            height,
            markers.len()
        );
        self.lines.push(LineBox {
            x: line.window_left,
            y: top - self.origin.y,
            width: line.window_width,
            content_width,
            height,
            baseline: metrics.baseline,
            fragments: markers,
            footnotes: line.footnotes,
            forced_break,
        });
        ctx.stats.lines_committed += 1;

        self.cursor = top + height;
        self.place_pending_floats_list(ctx, &line.pending_floats, self.cursor)?;
        self.start_line(ctx, self.cursor);
        Ok(())
    }

    fn place_pending_floats(&mut self, ctx: &mut LayoutContext, y: f32) -> Result<(), LayoutError> {
        let pending = std::mem::take(&mut self.line.pending_floats);
        self.place_pending_floats_list(ctx, &pending, y)
    }

    fn place_pending_floats_list(&self, ctx: &mut LayoutContext, floats: &[BoxId], y: f32) -> Result<(), LayoutError> {
        for id in floats {
            layout_float(ctx, *id, self.origin, self.width, y)?;
        }
        Ok(())
    }
}
