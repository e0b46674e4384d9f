//! Footnote areas and the page space they reserve.
//!
//! Each area is anchored to the page whose lines call its footnotes. The
//! area's height is the sum of its bodies' heights. When that height does not
//! fit below the minimum flow kept at the top of the anchor page, the area
//! continues on the following pages, each of which it claims entirely.

use crate::algorithms::pagination::PageSequence;
use crate::output::FootnotePlacement;
use flowbox_types::geometry::EPSILON;
use flowbox_types::{BoxId, LineRef};

#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteBody {
    pub body: BoxId,
    pub height: f32,
    /// The line holding the footnote call.
    pub owner: LineRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteArea {
    pub anchor: usize,
    pub bodies: Vec<FootnoteBody>,
    /// Consecutive page indices the area occupies, anchor first, with the
    /// height reserved on each.
    pub pages: Vec<(usize, f32)>,
    line_height: f32,
}

impl FootnoteArea {
    pub fn height(&self) -> f32 {
        self.bodies.iter().map(|b| b.height).sum()
    }

    pub fn reserved(&self) -> f32 {
        self.pages.iter().map(|(_, h)| h).sum()
    }
}

#[derive(Debug, Clone)]
pub struct FootnoteManager {
    areas: Vec<FootnoteArea>,
    min_lines: usize,
}

impl FootnoteManager {
    pub fn new(min_lines: usize) -> Self {
        Self {
            areas: Vec::new(),
            min_lines,
        }
    }

    pub fn areas(&self) -> &[FootnoteArea] {
        &self.areas
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn area_for_page(&self, page_index: usize) -> Option<&FootnoteArea> {
        self.areas.iter().find(|a| a.anchor == page_index)
    }

    /// Adds `body` to the area anchored on `page_index` and re-reserves the
    /// area's space. `line_height` is the height of the calling line and
    /// sets the threshold below which the area may not grow on that page.
    pub fn add_footnote_body(
        &mut self,
        pages: &mut PageSequence,
        page_index: usize,
        body: BoxId,
        height: f32,
        owner: LineRef,
        line_height: f32,
    ) {
        let position = match self.areas.iter().position(|a| a.anchor == page_index) {
            Some(position) => position,
            None => {
                self.areas.push(FootnoteArea {
                    anchor: page_index,
                    bodies: Vec::new(),
                    pages: Vec::new(),
                    line_height,
                });
                self.areas.len() - 1
            }
        };
        let min_lines = self.min_lines;
        let area = &mut self.areas[position];
        release(pages, area);
        area.bodies.push(FootnoteBody {
            body,
            height,
            owner,
        });
        area.line_height = area.line_height.max(line_height);
        reserve(pages, area, min_lines);
        log::debug!(
            "Footnote {} added to page {} area ({:.2} over {} page(s))",
            body,
            page_index + 1,
            area.height(),
            area.pages.len()
        );
    }

    /// Removes the given bodies called from `owner`. Areas left without
    /// bodies are dropped; every reservation they held is released.
    pub fn remove_footnote_bodies(&mut self, pages: &mut PageSequence, bodies: &[BoxId], owner: LineRef) {
        self.remove_where(pages, |b| b.owner == owner && bodies.contains(&b.body));
    }

    /// Removes every body whose calling line satisfies `pred`.
    pub fn remove_owned_by(&mut self, pages: &mut PageSequence, mut pred: impl FnMut(LineRef) -> bool) {
        self.remove_where(pages, |b| pred(b.owner));
    }

    fn remove_where(&mut self, pages: &mut PageSequence, mut pred: impl FnMut(&FootnoteBody) -> bool) {
        let min_lines = self.min_lines;
        for area in &mut self.areas {
            if !area.bodies.iter().any(&mut pred) {
                continue;
            }
            release(pages, area);
            area.bodies.retain(|b| !pred(b));
            if !area.bodies.is_empty() {
                reserve(pages, area, min_lines);
            }
        }
        self.areas.retain(|a| !a.bodies.is_empty());
    }

    /// Forgets areas and reservations on pages at or after `index`; called
    /// before those pages are trimmed.
    pub fn forget_pages_from(&mut self, index: usize) {
        self.areas.retain(|a| a.anchor < index);
        for area in &mut self.areas {
            area.pages.retain(|(p, _)| *p < index);
        }
    }

    /// Where every body goes: each area is stacked against the bottom of its
    /// anchor page and continues at the top of the following pages.
    pub fn placements(&self, pages: &PageSequence) -> Vec<FootnotePlacement> {
        let mut out = Vec::new();
        for area in &self.areas {
            let mut segments = Vec::new();
            let mut start = 0.0f32;
            for (i, (index, reserved)) in area.pages.iter().enumerate() {
                let Some(page) = pages.page(*index) else {
                    continue;
                };
                let top = if i == 0 { page.bottom - reserved } else { page.top };
                segments.push((start, *index, top));
                start += reserved;
            }
            let mut offset = 0.0f32;
            for body in &area.bodies {
                let segment = segments
                    .iter()
                    .rev()
                    .find(|(s, _, _)| *s <= offset + EPSILON)
                    .or_else(|| segments.first());
                if let Some((seg_start, page_index, top)) = segment {
                    out.push(FootnotePlacement {
                        body: body.body,
                        page_index: *page_index,
                        y: top + (offset - seg_start).max(0.0),
                    });
                }
                offset += body.height;
            }
        }
        out
    }
}

fn release(pages: &mut PageSequence, area: &mut FootnoteArea) {
    for (index, reserved) in area.pages.drain(..) {
        if let Some(page) = pages.page_mut(index) {
            page.footnote_reserved = (page.footnote_reserved - reserved).max(0.0);
        }
    }
}

fn reserve(pages: &mut PageSequence, area: &mut FootnoteArea, min_lines: usize) {
    let desired = area.height();
    let Some(anchor) = pages.page(area.anchor) else {
        return;
    };
    let threshold_y = anchor.top + min_lines as f32 * area.line_height;
    let available = (anchor.bottom - anchor.footnote_reserved - threshold_y).max(0.0);
    let name = anchor.name.clone();

    if desired <= available + EPSILON {
        area.pages.push((area.anchor, desired));
    } else {
        area.pages.push((area.anchor, available));
        let mut covered = available;
        let mut index = area.anchor + 1;
        while covered + EPSILON < desired {
            while pages.len() <= index {
                pages.push_page(name.clone());
            }
            let Some(page) = pages.page(index) else {
                break;
            };
            let full = page.content_height() - page.footnote_reserved;
            area.pages.push((index, full.max(0.0)));
            covered += page.content_height();
            index += 1;
        }
    }

    for (index, reserved) in &area.pages {
        if let Some(page) = pages.page_mut(*index) {
            page.footnote_reserved += reserved;
        }
    }
}
