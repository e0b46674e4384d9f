//! Boxes taken out of normal flow: floats, footnote bodies and absolutely
//! or fixed positioned boxes.
//!
//! All of them are laid out without pagination at a provisional position
//! and then moved into place with `BoxTree::translate_subtree`.

use super::block::{BlockInput, layout_block_box};
use super::intrinsic::shrink_to_fit;
use crate::LayoutError;
use crate::algorithms::floats::BoxOffset;
use crate::interface::{LayoutContext, PendingAbsolute};
use crate::tree::{BoxKind, BoxTree};
use flowbox_style::dimension::Dimension;
use flowbox_style::display::Position;
use flowbox_types::{BoxId, LineRef, Point};

/// Lays out `id` without page breaks, its border box top at `top`.
fn layout_detached(ctx: &mut LayoutContext, id: BoxId, input: BlockInput) -> Result<(), LayoutError> {
    ctx.enter_no_page_break();
    let result = layout_block_box(ctx, id, input);
    ctx.exit_no_page_break();
    result
}

/// Content width of a shrink-to-fit box inside `available` (margin box).
fn fitted_width(ctx: &mut LayoutContext, id: BoxId, available: f32) -> Result<f32, LayoutError> {
    let style = ctx.tree.style(id)?;
    if let Some(width) = style.box_model.width.and_then(|w| w.resolve(available)) {
        return Ok(width);
    }
    if let BoxKind::Replaced(size) = ctx.tree.get(id)?.kind {
        return Ok(size.width);
    }
    let edges = style.margin_edges().horizontal() + style.padding_x() + style.border_x();
    shrink_to_fit(ctx, id, (available - edges).max(0.0))
}

/// Explicit or intrinsic content height of a replaced box.
fn replaced_height(tree: &BoxTree, id: BoxId) -> Result<Option<f32>, LayoutError> {
    let b = tree.get(id)?;
    let explicit = match b.style.box_model.height {
        Some(Dimension::Pt(h)) => Some(h),
        _ => None,
    };
    Ok(match b.kind {
        BoxKind::Replaced(size) => explicit.or(Some(size.height)),
        _ => explicit,
    })
}

/// Sets `x`/`y` of `id` relative to the content box at `origin`.
fn set_relative_position(tree: &mut BoxTree, id: BoxId, origin: Point) -> Result<(), LayoutError> {
    let g = &mut tree.get_mut(id)?.geometry;
    g.x = g.abs_x - origin.x;
    g.y = g.abs_y - origin.y;
    Ok(())
}

/// Lays out an atomic inline (inline-block or replaced box) with its
/// margin box top-left at `(left, top)`. Returns the margin box size.
pub fn layout_atomic_inline(
    ctx: &mut LayoutContext,
    id: BoxId,
    left: f32,
    top: f32,
    available: f32,
) -> Result<(f32, f32), LayoutError> {
    let style = ctx.tree.style(id)?;
    let margin = style.margin_edges();
    let width = fitted_width(ctx, id, available)?;
    let height = replaced_height(ctx.tree, id)?;
    layout_detached(
        ctx,
        id,
        BlockInput {
            cb_origin: Point::new(left, top),
            cb_width: available,
            top: top + margin.top,
            width: Some(width),
            height,
        },
    )?;
    let g = ctx.tree.geometry(id)?;
    Ok((g.margin_box_width(), g.margin_box_height()))
}

/// Lays out a float and places it no higher than `y` inside the containing
/// block whose content box starts at `cb_origin` and is `cb_width` wide.
pub fn layout_float(
    ctx: &mut LayoutContext,
    id: BoxId,
    cb_origin: Point,
    cb_width: f32,
    y: f32,
) -> Result<BoxOffset, LayoutError> {
    let style = ctx.tree.style(id)?;
    let margin = style.margin_edges();
    let width = fitted_width(ctx, id, cb_width)?;
    let height = replaced_height(ctx.tree, id)?;
    layout_detached(
        ctx,
        id,
        BlockInput {
            cb_origin: Point::new(cb_origin.x, y),
            cb_width,
            top: y + margin.top,
            width: Some(width),
            height,
        },
    )?;
    let g = ctx.tree.geometry(id)?;
    let (w, h) = (g.margin_box_width(), g.margin_box_height());
    let side = style.flow.float;
    let clear = style.flow.clear;
    let mut offset = ctx.place_float(id, side, clear, w, h, y, cb_origin.x, cb_width);

    // A float that runs off its page starts on the next one instead.
    if ctx.paginating() && ctx.crosses(offset.y, offset.bottom()) && !ctx.is_at_page_top(offset.y) {
        let next_top = ctx.next_page_top(offset.y);
        ctx.remove_float(id);
        offset = ctx.place_float(id, side, clear, w, h, next_top, cb_origin.x, cb_width);
    }

    ctx.tree
        .translate_subtree(id, offset.x + margin.left - g.abs_x, offset.y + margin.top - g.abs_y);
    set_relative_position(ctx.tree, id, cb_origin)?;
    Ok(offset)
}

/// Lays out a footnote body at the top left of the page area, at the width
/// of the page content area. Returns its margin box height.
pub fn layout_footnote_body(ctx: &mut LayoutContext, body: BoxId, page_index: usize) -> Result<f32, LayoutError> {
    let width = ctx
        .pages
        .page(page_index)
        .map_or(0.0, |p| p.content_width());
    let style = ctx.tree.style(body)?;
    let margin = style.margin_edges();
    layout_detached(
        ctx,
        body,
        BlockInput {
            cb_origin: Point::new(0.0, 0.0),
            cb_width: width,
            top: margin.top,
            width: None,
            height: None,
        },
    )?;
    Ok(ctx.tree.geometry(body)?.margin_box_height())
}

/// The box whose padding box positions `id`: the nearest positioned block
/// ancestor, or the root.
pub fn containing_block(tree: &BoxTree, id: BoxId) -> BoxId {
    let mut current = tree.get(id).ok().and_then(|b| b.parent);
    let mut last = id;
    while let Some(ancestor) = current {
        let Ok(b) = tree.get(ancestor) else {
            break;
        };
        if matches!(b.kind, BoxKind::Block) && b.style.flow.position != Position::Static {
            return ancestor;
        }
        last = ancestor;
        current = b.parent;
    }
    last
}

/// Handles an out-of-flow child met in block flow. `y` is where the next
/// in-flow box would start.
pub fn layout_out_of_flow_child(
    ctx: &mut LayoutContext,
    parent: BoxId,
    child: BoxId,
    origin: Point,
    width: f32,
    y: f32,
) -> Result<(), LayoutError> {
    let style = ctx.tree.style(child)?;
    if style.is_floated() {
        layout_float(ctx, child, origin, width, y)?;
    } else if style.is_footnote() {
        // No line to anchor to: the parent block owns the call.
        let page = ctx.page_index(y);
        let height = layout_footnote_body(ctx, child, page)?;
        let line_height = style.text.line_height;
        let pages = &mut ctx.pages;
        ctx.footnotes
            .add_footnote_body(pages, page, child, height, LineRef::new(parent, usize::MAX), line_height);
        ctx.stats.footnotes_added += 1;
    } else {
        let containing_block = containing_block(ctx.tree, child);
        ctx.register_absolute(PendingAbsolute {
            id: child,
            containing_block,
            static_position: Point::new(origin.x, y),
        });
    }
    Ok(())
}

/// Lays out every absolutely positioned box waiting for `containing_block`.
pub fn layout_absolutes_for(ctx: &mut LayoutContext, containing_block: BoxId) -> Result<(), LayoutError> {
    for entry in ctx.take_absolutes_for(containing_block) {
        layout_absolute(ctx, entry)?;
    }
    Ok(())
}

/// Lays out whatever is still waiting once the whole tree is done.
pub fn layout_remaining_absolutes(ctx: &mut LayoutContext) -> Result<(), LayoutError> {
    // Laying one out may register more.
    loop {
        let pending = ctx.take_all_absolutes();
        if pending.is_empty() {
            return Ok(());
        }
        for entry in pending {
            layout_absolute(ctx, entry)?;
        }
    }
}

/// The rectangle insets resolve against and the origin `x`/`y` are
/// relative to.
struct PositioningArea {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    origin: Point,
}

fn positioning_area(ctx: &mut LayoutContext, entry: &PendingAbsolute, fixed: bool) -> Result<PositioningArea, LayoutError> {
    if fixed {
        let index = ctx.page_index(entry.static_position.y);
        if let Some(page) = ctx.pages.page(index) {
            return Ok(PositioningArea {
                left: 0.0,
                top: page.top,
                width: page.content_width(),
                height: page.content_height(),
                origin: Point::new(0.0, page.top),
            });
        }
    }
    let g = ctx.tree.geometry(entry.containing_block)?;
    Ok(PositioningArea {
        left: g.abs_x + g.border.left,
        top: g.abs_y + g.border.top,
        width: g.content_width + g.padding.horizontal(),
        height: g.content_height + g.padding.vertical(),
        origin: g.content_origin(),
    })
}

fn layout_absolute(ctx: &mut LayoutContext, entry: PendingAbsolute) -> Result<(), LayoutError> {
    let id = entry.id;
    let style = ctx.tree.style(id)?;
    let area = positioning_area(ctx, &entry, style.flow.position == Position::Fixed)?;
    let margin = style.margin_edges();
    let decoration_x = style.padding_x() + style.border_x();
    let decoration_y = style.padding_y() + style.border_y();

    let left = style.flow.left.resolve(area.width);
    let right = style.flow.right.resolve(area.width);
    let top = style.flow.top.resolve(area.height);
    let bottom = style.flow.bottom.resolve(area.height);

    let intrinsic_width = match ctx.tree.get(id)?.kind {
        BoxKind::Replaced(size) => Some(size.width),
        _ => None,
    };
    let width = match style.box_model.width.and_then(|w| w.resolve(area.width)) {
        Some(w) => w,
        None => match (left, right, intrinsic_width) {
            (_, _, Some(w)) => w,
            (Some(l), Some(r), None) => (area.width - l - r - margin.horizontal() - decoration_x).max(0.0),
            _ => {
                let available = area.width - left.unwrap_or(0.0) - right.unwrap_or(0.0);
                fitted_width(ctx, id, available)?
            }
        },
    };
    let height = match (replaced_height(ctx.tree, id)?, top, bottom) {
        (Some(h), _, _) => Some(h),
        (None, Some(t), Some(b)) => Some((area.height - t - b - margin.vertical() - decoration_y).max(0.0)),
        _ => None,
    };

    layout_detached(
        ctx,
        id,
        BlockInput {
            cb_origin: Point::new(area.left, entry.static_position.y),
            cb_width: area.width,
            top: entry.static_position.y + margin.top,
            width: Some(width),
            height,
        },
    )?;

    let g = ctx.tree.geometry(id)?;
    let x = match (left, right) {
        (Some(l), _) => area.left + l,
        (None, Some(r)) => area.left + area.width - r - g.margin_box_width(),
        (None, None) => entry.static_position.x,
    };
    let y = match (top, bottom) {
        (Some(t), _) => area.top + t,
        (None, Some(b)) => area.top + area.height - b - g.margin_box_height(),
        (None, None) => entry.static_position.y,
    };
    ctx.tree
        .translate_subtree(id, x + margin.left - g.abs_x, y + margin.top - g.abs_y);
    set_relative_position(ctx.tree, id, area.origin)?;
    log::trace!("Positioned {} at ({:.2}, {:.2})", id, x, y);
    Ok(())
}
