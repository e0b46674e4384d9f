use super::inline::layout_inline_content;
use super::positioned::{layout_absolutes_for, layout_out_of_flow_child};
use crate::LayoutError;
use crate::interface::{KeepTogetherPolicy, LayoutContext};
use crate::state::{LayoutState, PendingMarker};
use crate::style::ComputedStyle;
use crate::tree::{BoxGeometry, BoxTree};
use flowbox_style::dimension::Dimension;
use flowbox_style::display::{Display, Position};
use flowbox_style::list::ListStylePosition;
use flowbox_style::paging::{PageBreak, PageBreakInside, PageSide, RepeatOnPage};
use flowbox_types::geometry::EPSILON;
use flowbox_types::{BoxId, Point};
use std::sync::Arc;

/// Where and how wide a block box is laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockInput {
    /// Document position of the containing block's content box. Its `x` is
    /// also the left edge of this box's margin box.
    pub cb_origin: Point,
    pub cb_width: f32,
    /// Document Y of this box's border box top.
    pub top: f32,
    /// Content width decided by the caller (shrink-to-fit, positioned boxes).
    pub width: Option<f32>,
    /// Content height decided by the caller.
    pub height: Option<f32>,
}

impl BlockInput {
    pub fn in_flow(cb_origin: Point, cb_width: f32, top: f32) -> Self {
        Self {
            cb_origin,
            cb_width,
            top,
            width: None,
            height: None,
        }
    }
}

/// Lays out one block container and everything inside it.
pub fn layout_block_box(ctx: &mut LayoutContext, id: BoxId, input: BlockInput) -> Result<(), LayoutError> {
    let style = ctx.tree.style(id)?;
    let mut margin = style.margin_edges();
    let border = style.border_edges();
    let padding = style.padding_edges();
    let decoration_x = border.horizontal() + padding.horizontal();

    let explicit_width = style.box_model.width.and_then(|w| w.resolve(input.cb_width));
    let content_width = input
        .width
        .or(explicit_width)
        .unwrap_or(input.cb_width - margin.horizontal() - decoration_x)
        .max(0.0);
    if input.width.is_none() && explicit_width.is_some() {
        let free = input.cb_width - content_width - decoration_x;
        match (style.box_model.margin_left_auto, style.box_model.margin_right_auto) {
            (true, true) => {
                margin.left = (free / 2.0).max(0.0);
                margin.right = margin.left;
            }
            (true, false) => margin.left = (free - margin.right).max(0.0),
            (false, true) => margin.right = (free - margin.left).max(0.0),
            (false, false) => {}
        }
    }

    let geometry = BoxGeometry {
        x: margin.left,
        y: input.top - input.cb_origin.y,
        abs_x: input.cb_origin.x + margin.left,
        abs_y: input.top,
        content_width,
        content_height: 0.0,
        margin,
        border,
        padding,
        rel_offset: Point::default(),
    };
    let establishes_bfc = {
        let b = ctx.tree.get_mut(id)?;
        b.geometry = geometry;
        b.lines.clear();
        b.needs_page_clear = false;
        b.establishes_bfc()
    };
    let origin = geometry.content_origin();

    if establishes_bfc {
        ctx.push_bfc(id, origin);
    }
    ctx.push_pseudo_styles(
        id,
        style.pseudo.first_line.clone(),
        style.pseudo.first_letter.clone(),
    );
    if style.flow.display == Display::ListItem {
        if let Some(text) = ctx.tree.get(id)?.marker.clone() {
            ctx.set_pending_marker(PendingMarker {
                owner: id,
                text,
                inside: style.list.style_position == ListStylePosition::Inside,
                style: style.clone(),
            });
        }
    }

    let mut content_height = if ctx.tree.has_inline_children(id)? {
        layout_inline_content(ctx, id)?
    } else {
        layout_block_children(ctx, id)?
    };

    if establishes_bfc {
        if let Some(bottom) = ctx.lowest_float_bottom() {
            content_height = content_height.max(bottom - origin.y);
        }
        ctx.pop_bfc();
    }
    ctx.pop_pseudo_styles(id);
    if ctx.pending_marker().is_some_and(|m| m.owner == id) {
        ctx.take_pending_marker();
    }

    let explicit_height = input.height.or(match style.box_model.height {
        Some(Dimension::Pt(h)) => Some(h),
        _ => None,
    });
    let mut height = explicit_height.unwrap_or(content_height);
    if let Dimension::Pt(min) = style.box_model.min_height {
        height = height.max(min);
    }
    {
        let g = &mut ctx.tree.get_mut(id)?.geometry;
        g.content_height = height.max(0.0);
        g.rel_offset = relative_offset(&style, input.cb_width);
    }

    if style.flow.position != Position::Static {
        layout_absolutes_for(ctx, id)?;
    }
    Ok(())
}

fn relative_offset(style: &ComputedStyle, cb_width: f32) -> Point {
    if style.flow.position != Position::Relative {
        return Point::default();
    }
    let flow = &style.flow;
    let dx = flow
        .left
        .resolve(cb_width)
        .or_else(|| flow.right.resolve(cb_width).map(|r| -r))
        .unwrap_or(0.0);
    let dy = flow
        .top
        .resolve(0.0)
        .or_else(|| flow.bottom.resolve(0.0).map(|b| -b))
        .unwrap_or(0.0);
    Point::new(dx, dy)
}

/// Outcome of one layout attempt of a block child.
#[derive(Debug, Clone, Copy)]
struct Attempt {
    crossed: bool,
    /// The child started at the top of a page, so breaking before it again
    /// cannot help.
    at_page_top: bool,
}

/// How a child is to be started.
#[derive(Debug, Clone)]
struct Start {
    forced: bool,
    side: Option<PageSide>,
    page_name: Option<Arc<str>>,
}

/// State at the first child of a run of siblings joined by
/// `page-break-after/before: avoid`.
#[derive(Debug, Clone)]
struct RunStart {
    index: usize,
    cursor: f32,
    prev_margin: f32,
    prev: Option<BoxId>,
    pending_break: PageBreak,
    state: LayoutState,
    page_count: usize,
    /// 0: not relaid, 1: relaid from a new page, 2: relaid accepting the split.
    relaid: u8,
    /// The first child of the run started at the top of a page.
    first_at_page_top: bool,
}

/// Lays out the block-level children of `parent` and returns the height of
/// its content.
pub fn layout_block_children(ctx: &mut LayoutContext, parent: BoxId) -> Result<f32, LayoutError> {
    let geometry = ctx.tree.geometry(parent)?;
    let origin = geometry.content_origin();
    let width = geometry.content_width;
    let children = ctx.tree.children(parent)?;
    let parent_page = ctx.page_name();
    let saved_policy = ctx.keep_policy;
    let saved_extra = (ctx.extra_top(), ctx.extra_bottom());

    for child in &children {
        ctx.stats.clear_block_attempts(*child);
    }

    // `cursor` is the bottom of the previous in-flow border box; its bottom
    // margin is still pending in `prev_margin`.
    let mut cursor = origin.y;
    let mut prev_margin = 0.0f32;
    let mut prev: Option<BoxId> = None;
    let mut pending_break = PageBreak::Auto;
    let mut force_next = false;
    let mut run: Option<RunStart> = None;
    let mut i = 0;

    while i < children.len() {
        let child = children[i];
        let b = ctx.tree.get(child)?;
        if !b.is_displayed() {
            i += 1;
            continue;
        }
        if b.is_out_of_flow() {
            layout_out_of_flow_child(ctx, parent, child, origin, width, cursor + prev_margin)?;
            i += 1;
            continue;
        }
        let style = b.style.clone();

        if style.paging.repeat == RepeatOnPage::Footer && ctx.paginating() {
            layout_repeated_footer(ctx, child, origin, width, cursor + prev_margin)?;
            i += 1;
            continue;
        }

        let linked = match prev {
            Some(p) => joined_by_avoid(ctx.tree, p, child)?,
            None => false,
        };
        if !linked && run.as_ref().is_none_or(|r| r.index != i) {
            run = Some(RunStart {
                index: i,
                cursor,
                prev_margin,
                prev,
                pending_break,
                state: ctx.capture_state(),
                page_count: ctx.pages.len(),
                relaid: 0,
                first_at_page_top: false,
            });
        }

        let paginating = ctx.paginating();
        let page_name = style.paging.page.clone().or_else(|| parent_page.clone());
        let forced_by_style =
            paginating && (pending_break.is_forced() || style.paging.break_before.is_forced());
        let start = Start {
            forced: force_next || forced_by_style || (paginating && page_name != ctx.page_name()),
            side: style
                .paging
                .break_before
                .required_side()
                .or_else(|| pending_break.required_side()),
            page_name,
        };
        force_next = false;

        let check_avoid = paginating
            && ctx.keep_policy == KeepTogetherPolicy::Allow
            && style.paging.break_inside == PageBreakInside::Avoid;

        let snapshot = ctx.capture_state();
        let pages_before = ctx.pages.len();
        let mut attempt = place_child(ctx, child, &style, origin, width, cursor, prev_margin, &start, check_avoid)?;

        if paginating {
            let needs_clear = ctx.tree.get(child)?.needs_page_clear;
            let violates = check_avoid && attempt.crossed;
            if violates || needs_clear {
                if attempt.at_page_top {
                    if violates {
                        accept_violation(ctx, child, "content taller than a page");
                    }
                } else {
                    log::debug!("Relaying {} from a new page", child);
                    ctx.discard_attempt(&[child], &snapshot, pages_before);
                    let moved = Start {
                        forced: true,
                        ..start.clone()
                    };
                    attempt = place_child(ctx, child, &style, origin, width, cursor, prev_margin, &moved, check_avoid)?;
                    if check_avoid && attempt.crossed {
                        if !needs_clear {
                            ctx.discard_attempt(&[child], &snapshot, pages_before);
                            place_child(ctx, child, &style, origin, width, cursor, prev_margin, &start, check_avoid)?;
                        }
                        accept_violation(ctx, child, "still crosses after moving to a new page");
                    }
                }
            }
        }

        let g = ctx.tree.geometry(child)?;
        if let Some(r) = run.as_mut().filter(|r| r.index == i) {
            r.first_at_page_top = attempt.at_page_top;
        }

        if linked && ctx.paginating() && ctx.keep_policy == KeepTogetherPolicy::Allow {
            if let (Some(p), Some(r)) = (prev, run.as_mut()) {
                if r.relaid < 2 && split_between(ctx, p, child)? {
                    if r.relaid == 0 && r.first_at_page_top {
                        r.relaid = 2;
                        accept_violation(ctx, child, "avoid run longer than a page");
                    } else {
                        r.relaid += 1;
                        if r.relaid == 2 {
                            accept_violation(ctx, child, "avoid run still split");
                        }
                        log::debug!(
                            "Relaying avoid run {}..={} under {} (pass {})",
                            r.index,
                            i,
                            parent,
                            r.relaid + 1
                        );
                        ctx.stats.run_relayouts += 1;
                        let members = &children[r.index..=i];
                        ctx.discard_attempt(members, &r.state, r.page_count);
                        for member in members {
                            ctx.stats.clear_block_attempts(*member);
                        }
                        force_next = r.relaid == 1;
                        i = r.index;
                        cursor = r.cursor;
                        prev_margin = r.prev_margin;
                        prev = r.prev;
                        pending_break = r.pending_break;
                        continue;
                    }
                }
            }
        }

        if style.paging.repeat == RepeatOnPage::Header && ctx.paginating() {
            let (top, bottom) = (ctx.extra_top(), ctx.extra_bottom());
            ctx.set_extra_space(top + g.margin_box_height(), bottom);
        }

        pending_break = if style.paging.break_after.is_forced() {
            style.paging.break_after
        } else {
            PageBreak::Auto
        };
        cursor = g.abs_y + g.border_box_height();
        prev_margin = g.margin.bottom;
        prev = Some(child);
        i += 1;
    }

    ctx.keep_policy = saved_policy;
    ctx.set_extra_space(saved_extra.0, saved_extra.1);

    if prev.is_none() {
        return Ok(0.0);
    }
    Ok((cursor + prev_margin - origin.y).max(0.0))
}

#[allow(clippy::too_many_arguments)]
fn place_child(
    ctx: &mut LayoutContext,
    child: BoxId,
    style: &ComputedStyle,
    origin: Point,
    width: f32,
    cursor: f32,
    prev_margin: f32,
    start: &Start,
    check_avoid: bool,
) -> Result<Attempt, LayoutError> {
    ctx.stats.record_block_attempt(child);

    let mut top = cursor + prev_margin.max(style.box_model.margin.top);
    let mut at_page_top = ctx.paginating() && ctx.is_at_page_top(cursor);

    if ctx.paginating() && (start.forced || start.page_name != ctx.page_name()) {
        let index = start_on_new_page(ctx, cursor, start);
        if let Some(page) = ctx.pages.page(index) {
            // The top margin is truncated at a break.
            top = page.top + ctx.extra_top();
            at_page_top = true;
        }
    }
    top += ctx.clear_delta(top, style.flow.clear);

    let policy = ctx.keep_policy;
    if check_avoid {
        ctx.keep_policy = KeepTogetherPolicy::Deny;
    }
    let result = layout_block_box(ctx, child, BlockInput::in_flow(origin, width, top));
    ctx.keep_policy = policy;
    result?;

    // The box itself starts below its margin.
    let g = ctx.tree.geometry(child)?;
    let bottom = g.abs_y + g.border_box_height();
    let crossed = ctx.crosses(g.abs_y, bottom);
    if crossed {
        log::debug!(
            "{} spans a page break ({:.2}..{:.2}), attempt {}",
            child,
            g.abs_y,
            bottom,
            ctx.stats.max_block_attempts
        );
    }
    Ok(Attempt { crossed, at_page_top })
}

/// Moves to the top of a fresh page for a forced break or a page name
/// change, honouring the required side. Returns the page index.
fn start_on_new_page(ctx: &mut LayoutContext, cursor: f32, start: &Start) -> usize {
    let mut index = ctx.page_index(cursor);
    if !ctx.is_at_page_top(cursor) {
        let top = ctx.next_page_top(cursor);
        index = ctx.page_index(top);
    }
    if let Some(side) = start.side {
        let mismatched = ctx.pages.page(index).is_some_and(|p| p.side != side);
        if mismatched {
            // A blank page keeps the parity.
            let page_top = ctx.pages.page(index).map_or(cursor, |p| p.top);
            let top = ctx.next_page_top(page_top);
            index = ctx.page_index(top);
        }
    }
    if start.page_name != ctx.page_name() {
        ctx.pages.rename(index, start.page_name.clone());
        ctx.set_page_name(start.page_name.clone());
    }
    index
}

fn accept_violation(ctx: &mut LayoutContext, child: BoxId, reason: &str) {
    log::warn!("Accepting page break inside avoided content at {}: {}", child, reason);
    ctx.stats.accepted_violations += 1;
    ctx.keep_policy = KeepTogetherPolicy::Deny;
}

/// Footers repeated at the bottom of the pages spanned by the following
/// siblings take no space in flow; the space is reserved on every page. The
/// footer itself is moved into that space on the page it is met on.
fn layout_repeated_footer(
    ctx: &mut LayoutContext,
    child: BoxId,
    origin: Point,
    width: f32,
    y: f32,
) -> Result<(), LayoutError> {
    let margin_top = ctx.tree.style(child)?.box_model.margin.top;
    ctx.enter_no_page_break();
    let result = layout_block_box(ctx, child, BlockInput::in_flow(origin, width, y + margin_top));
    ctx.exit_no_page_break();
    result?;

    let g = ctx.tree.geometry(child)?;
    let height = g.margin_box_height();
    let (top, bottom) = (ctx.extra_top(), ctx.extra_bottom());
    let index = ctx.page_index(y);
    if let Some(page) = ctx.pages.page(index) {
        let slot = page.flow_bottom() - bottom - height;
        ctx.tree.translate_subtree(child, 0.0, slot + margin_top - g.abs_y);
        ctx.tree.get_mut(child)?.geometry.y = slot + margin_top - origin.y;
    }
    ctx.set_extra_space(top, bottom + height);
    Ok(())
}

fn joined_by_avoid(tree: &BoxTree, prev: BoxId, next: BoxId) -> Result<bool, LayoutError> {
    Ok(tree.get(prev)?.style.paging.break_after == PageBreak::Avoid
        || tree.get(next)?.style.paging.break_before == PageBreak::Avoid)
}

/// Whether a page boundary falls between the bottom of `prev` and the first
/// content of `next`.
fn split_between(ctx: &mut LayoutContext, prev: BoxId, next: BoxId) -> Result<bool, LayoutError> {
    let g = ctx.tree.geometry(prev)?;
    let prev_bottom = (g.abs_bottom() - EPSILON).max(g.abs_y);
    let next_first = first_content_y(ctx.tree, next)?;
    let a = ctx.pages.find_page(prev_bottom);
    let b = ctx.pages.find_page(next_first);
    Ok(a != b)
}

/// Document Y of the first line (or first box) inside `id`.
pub fn first_content_y(tree: &BoxTree, id: BoxId) -> Result<f32, LayoutError> {
    let b = tree.get(id)?;
    if let Some(line) = b.lines.first() {
        return Ok(b.geometry.content_origin().y + line.y);
    }
    for child in &b.children {
        let c = tree.get(*child)?;
        if c.is_displayed() && c.is_block_level() {
            return first_content_y(tree, *child);
        }
    }
    Ok(b.geometry.abs_y)
}
