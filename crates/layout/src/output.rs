//! Output types from the layout engine.
//!
//! The box tree itself carries every box's geometry and line boxes once
//! layout returns. `LaidOutDocument` adds the page structure on top: which
//! boxes and lines fall on which page, where footnote bodies were placed,
//! and where repeated headers and footers are drawn.

use crate::LayoutError;
use crate::algorithms::pagination::{PageBox, PageSequence};
use crate::perf::LayoutStats;
use crate::tree::{BoxKind, BoxTree};
use flowbox_style::paging::{PageSide, RepeatOnPage};
use flowbox_style::stylesheet::PageLayout;
use flowbox_types::geometry::EPSILON;
use flowbox_types::{BoxId, LineRef, Rect};
use std::sync::Arc;

/// Where a footnote body ended up: its margin box top, in document
/// coordinates, on page `page_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootnotePlacement {
    pub body: BoxId,
    pub page_index: usize,
    pub y: f32,
}

/// A repeated header or footer drawn on a page other than (or in addition
/// to) where it sits in flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatedBox {
    pub id: BoxId,
    pub kind: RepeatOnPage,
    /// Document Y at which the box's border box top is drawn on this page.
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageFrame {
    /// 1-based page number.
    pub number: usize,
    pub side: PageSide,
    pub first: bool,
    pub name: Option<Arc<str>>,
    pub layout: PageLayout,
    /// The page's content area in document coordinates.
    pub content_rect: Rect,
    /// Space held for footnotes at the bottom of the content area.
    pub footnote_area: Option<Rect>,
    pub footnotes: Vec<FootnotePlacement>,
    /// Displayed boxes whose border box starts on this page, in tree order.
    pub boxes: Vec<BoxId>,
    pub lines: Vec<LineRef>,
    pub repeated: Vec<RepeatedBox>,
}

impl PageFrame {
    fn new(page: &PageBox) -> Self {
        let width = page.content_width();
        let footnote_area = (page.footnote_reserved > 0.0).then(|| {
            Rect::new(
                0.0,
                page.bottom - page.footnote_reserved,
                width,
                page.footnote_reserved,
            )
        });
        Self {
            number: page.number,
            side: page.side,
            first: page.first,
            name: page.name.clone(),
            layout: page.layout.clone(),
            content_rect: Rect::new(0.0, page.top, width, page.content_height()),
            footnote_area,
            footnotes: Vec::new(),
            boxes: Vec::new(),
            lines: Vec::new(),
            repeated: Vec::new(),
        }
    }

    /// Document Y of the top of this page's content area.
    pub fn top(&self) -> f32 {
        self.content_rect.y
    }

    pub fn bottom(&self) -> f32 {
        self.content_rect.bottom()
    }
}

/// The result of laying out one box tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub pages: Vec<PageFrame>,
    pub stats: LayoutStats,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the page `id` starts on.
    pub fn page_of(&self, id: BoxId) -> Option<usize> {
        self.pages.iter().position(|p| p.boxes.contains(&id))
    }
}

pub(crate) fn build_document(
    tree: &BoxTree,
    root: BoxId,
    pages: &PageSequence,
    placements: Vec<FootnotePlacement>,
    stats: LayoutStats,
) -> Result<LaidOutDocument, LayoutError> {
    let mut frames: Vec<PageFrame> = pages.pages().iter().map(PageFrame::new).collect();
    let page_of = |y: f32| pages.find_page(y).unwrap_or(frames_last(pages));

    for placement in placements {
        if let Some(frame) = frames.get_mut(placement.page_index) {
            frame.footnotes.push(placement);
        }
    }

    for id in tree.subtree(root) {
        let b = tree.get(id)?;
        if !b.is_displayed() || matches!(b.kind, BoxKind::Text(_) | BoxKind::LineBreak) {
            continue;
        }
        let g = &b.geometry;
        if let Some(frame) = frames.get_mut(page_of(g.abs_y)) {
            frame.boxes.push(id);
        }
        let origin = g.content_origin();
        for (index, line) in b.lines.iter().enumerate() {
            if let Some(frame) = frames.get_mut(page_of(origin.y + line.y)) {
                frame.lines.push(LineRef::new(id, index));
            }
        }
        if b.style.paging.repeat != RepeatOnPage::None {
            place_repeats(tree, id, &mut frames, &page_of)?;
        }
    }

    Ok(LaidOutDocument { pages: frames, stats })
}

fn frames_last(pages: &PageSequence) -> usize {
    pages.len().saturating_sub(1)
}

/// Adds `id` to the repeated boxes of every page its parent's content
/// continues on. Headers repeat from the page after their own; footers
/// start on their own page. Several repeats on a page stack from the top
/// (headers) or up from the footnote area (footers) in tree order.
fn place_repeats(
    tree: &BoxTree,
    id: BoxId,
    frames: &mut [PageFrame],
    page_of: &dyn Fn(f32) -> usize,
) -> Result<(), LayoutError> {
    let b = tree.get(id)?;
    let Some(parent) = b.parent else {
        return Ok(());
    };
    let g = b.geometry;
    let kind = b.style.paging.repeat;
    let parent_geometry = tree.geometry(parent)?;
    let parent_end = parent_geometry.content_origin().y + parent_geometry.content_height;
    let own = page_of(g.abs_y);
    let last = page_of((parent_end - EPSILON).max(g.abs_y));
    let first = match kind {
        RepeatOnPage::Header => own + 1,
        _ => own,
    };

    for index in first..=last {
        let Some(frame) = frames.get_mut(index) else {
            break;
        };
        let stacked: f32 = frame
            .repeated
            .iter()
            .filter(|r| r.kind == kind)
            .filter_map(|r| tree.geometry(r.id).ok())
            .map(|other| other.margin_box_height())
            .sum();
        let y = match kind {
            RepeatOnPage::Header => frame.top() + stacked + g.margin.top,
            _ => {
                let floor = frame.footnote_area.map_or(frame.bottom(), |a| a.y);
                floor - stacked - g.margin_box_height() + g.margin.top
            }
        };
        frame.repeated.push(RepeatedBox { id, kind, y });
    }
    Ok(())
}
