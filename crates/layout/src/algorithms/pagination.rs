//! The page list and the "which page is offset Y on" queries.
//!
//! Pages tile document space: page `n + 1` starts exactly where page `n`
//! ends. Pages are only ever appended (on demand, when content reaches past
//! the last one) or trimmed from the end when a layout attempt is abandoned.

use crate::util::exceeds;
use flowbox_style::paging::PageSide;
use flowbox_style::stylesheet::{PageLayout, PageMasters};
use flowbox_types::geometry::EPSILON;
use std::cell::Cell;
use std::sync::Arc;

/// Smallest content height a page is given, so that creating pages for a
/// far-away offset always terminates.
const MIN_PAGE_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PageBox {
    /// 1-based page number.
    pub number: usize,
    /// Document Y of the top of the content area.
    pub top: f32,
    /// Document Y of the bottom of the content area.
    pub bottom: f32,
    pub layout: PageLayout,
    pub side: PageSide,
    pub first: bool,
    pub name: Option<Arc<str>>,
    /// Height at the bottom of the content area held for footnotes.
    pub footnote_reserved: f32,
}

impl PageBox {
    pub fn content_height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn content_width(&self) -> f32 {
        self.layout.content_width()
    }

    /// Bottom of the area normal flow may use.
    pub fn flow_bottom(&self) -> f32 {
        self.bottom - self.footnote_reserved
    }

    pub fn contains(&self, y: f32) -> bool {
        y >= self.top && y < self.bottom
    }
}

#[derive(Debug)]
pub struct PageSequence {
    pages: Vec<PageBox>,
    masters: Arc<PageMasters>,
    lookback: usize,
    last_requested: Cell<usize>,
    created: usize,
    trimmed: usize,
}

impl PageSequence {
    pub fn new(masters: Arc<PageMasters>, lookback: usize, first_name: Option<Arc<str>>) -> Self {
        let mut sequence = Self {
            pages: Vec::new(),
            masters,
            lookback,
            last_requested: Cell::new(0),
            created: 0,
            trimmed: 0,
        };
        sequence.push_page(first_name);
        sequence
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[PageBox] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&PageBox> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut PageBox> {
        self.pages.get_mut(index)
    }

    pub fn last(&self) -> &PageBox {
        // The sequence always holds at least one page.
        &self.pages[self.pages.len() - 1]
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn trimmed(&self) -> usize {
        self.trimmed
    }

    /// Appends one page named `name` directly below the last one.
    pub fn push_page(&mut self, name: Option<Arc<str>>) -> usize {
        let number = self.pages.len() + 1;
        let side = if number % 2 == 1 {
            PageSide::Right
        } else {
            PageSide::Left
        };
        let first = number == 1;
        let layout = self.masters.resolve(name.as_deref(), side, first);
        let top = self.pages.last().map_or(0.0, |p| p.bottom);
        let height = layout.content_height().max(MIN_PAGE_HEIGHT);
        log::debug!("Creating page {} ({:?}) at y={:.2}", number, side, top);
        self.pages.push(PageBox {
            number,
            top,
            bottom: top + height,
            layout,
            side,
            first,
            name,
            footnote_reserved: 0.0,
        });
        self.created += 1;
        self.pages.len() - 1
    }

    /// Index of the page containing `y`, creating pages as needed. Offsets
    /// above the first page map to the first page.
    pub fn get_page(&mut self, y: f32, name: Option<Arc<str>>) -> usize {
        if !y.is_finite() {
            return self.pages.len() - 1;
        }
        while y >= self.last().bottom {
            self.push_page(name.clone());
        }
        self.find_page(y).unwrap_or(0)
    }

    /// Index of the page containing `y`, without creating pages.
    pub fn find_page(&self, y: f32) -> Option<usize> {
        if self.pages.is_empty() {
            return None;
        }
        if y < self.pages[0].top {
            return Some(0);
        }
        if y >= self.last().bottom {
            return None;
        }

        let last = self.last_requested.get();
        if self.pages.get(last).is_some_and(|p| p.contains(y)) {
            return Some(last);
        }

        let count = self.pages.len();
        for index in (count.saturating_sub(self.lookback)..count).rev() {
            if self.pages[index].contains(y) {
                self.last_requested.set(index);
                return Some(index);
            }
        }

        let index = self.pages.partition_point(|p| p.bottom <= y);
        if index < count {
            self.last_requested.set(index);
            Some(index)
        } else {
            None
        }
    }

    /// Pages touched by `[top, bottom)`, creating them as needed.
    pub fn get_pages(&mut self, top: f32, bottom: f32, name: Option<Arc<str>>) -> Vec<usize> {
        let first = self.get_page(top, name.clone());
        let last = self.get_page((bottom - EPSILON).max(top), name);
        (first..=last).collect()
    }

    /// Whether content spanning `[top, bottom)` runs past the usable bottom
    /// of the page `top` is on. `extra_bottom` is space held for repeated
    /// footers.
    pub fn crosses_page_break(&mut self, top: f32, bottom: f32, extra_bottom: f32) -> bool {
        if top < 0.0 {
            return false;
        }
        let index = self.get_page(top, None);
        exceeds(bottom, self.pages[index].flow_bottom() - extra_bottom)
    }

    /// Top of the page following the one containing `y`, creating it if
    /// needed.
    pub fn next_page_top(&mut self, y: f32, name: Option<Arc<str>>) -> f32 {
        let index = self.get_page(y, name.clone());
        if index + 1 >= self.pages.len() {
            self.push_page(name);
        }
        self.pages[index + 1].top
    }

    /// Re-resolves the style of an existing page after its name changed.
    /// The page keeps its top; its bottom and every later page move with
    /// the new height.
    pub fn rename(&mut self, index: usize, name: Option<Arc<str>>) {
        let Some(page) = self.pages.get(index) else {
            return;
        };
        if page.name == name {
            return;
        }
        let layout = self.masters.resolve(name.as_deref(), page.side, page.first);
        let height = layout.content_height().max(MIN_PAGE_HEIGHT);
        let mut top = page.top;
        for (i, page) in self.pages.iter_mut().enumerate().skip(index) {
            if i == index {
                page.layout = layout.clone();
                page.name = name.clone();
                page.bottom = top + height;
            } else {
                let h = page.content_height();
                page.top = top;
                page.bottom = top + h;
            }
            top = page.bottom;
        }
    }

    /// Drops pages so that only `count` remain (at least one).
    pub fn trim(&mut self, count: usize) -> usize {
        let count = count.max(1);
        if count >= self.pages.len() {
            return 0;
        }
        let removed = self.pages.len() - count;
        log::debug!("Trimming {} trailing page(s)", removed);
        self.pages.truncate(count);
        self.trimmed += removed;
        if self.last_requested.get() >= count {
            self.last_requested.set(0);
        }
        removed
    }

    /// Grows the last page so that it reaches `y`; used when pagination is
    /// off and the document is one continuous page.
    pub fn extend_last(&mut self, y: f32) {
        let last = self.pages.len() - 1;
        if self.pages[last].bottom < y {
            self.pages[last].bottom = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowbox_style::dimension::{Margins, PageSize};

    fn masters(height: f32) -> Arc<PageMasters> {
        Arc::new(PageMasters::single(
            PageSize::Custom {
                width: 200.0,
                height,
            },
            Margins::all(0.0),
        ))
    }

    #[test]
    fn pages_are_created_on_demand_and_tile() {
        let mut pages = PageSequence::new(masters(100.0), 5, None);
        assert_eq!(pages.get_page(350.0, None), 3);
        assert_eq!(pages.len(), 4);
        for pair in pages.pages().windows(2) {
            assert_eq!(pair[0].bottom, pair[1].top);
        }
        assert_eq!(pages.page(0).map(|p| (p.first, p.side)), Some((true, PageSide::Right)));
        assert_eq!(pages.page(1).map(|p| p.side), Some(PageSide::Left));
        assert_eq!(pages.page(2).map(|p| p.side), Some(PageSide::Right));
    }

    #[test]
    fn find_page_does_not_create() {
        let pages = PageSequence::new(masters(100.0), 5, None);
        assert_eq!(pages.find_page(50.0), Some(0));
        assert_eq!(pages.find_page(150.0), None);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn get_pages_lists_every_touched_page() {
        let mut pages = PageSequence::new(masters(100.0), 5, None);
        assert_eq!(pages.get_pages(50.0, 250.0, None), vec![0, 1, 2]);
        // Ending exactly on a page bottom does not touch the next page.
        assert_eq!(pages.get_pages(100.0, 200.0, None), vec![1]);
    }

    #[test]
    fn lookup_falls_back_to_binary_search() {
        let mut pages = PageSequence::new(masters(10.0), 2, None);
        pages.get_page(995.0, None);
        assert_eq!(pages.len(), 100);
        assert_eq!(pages.find_page(5.0), Some(0));
        assert_eq!(pages.find_page(505.0), Some(50));
        assert_eq!(pages.find_page(990.0), Some(99));
    }

    #[test]
    fn crossing_respects_footnote_reservation() {
        let mut pages = PageSequence::new(masters(100.0), 5, None);
        assert!(!pages.crosses_page_break(80.0, 100.0, 0.0));
        assert!(pages.crosses_page_break(80.0, 101.0, 0.0));
        if let Some(page) = pages.page_mut(0) {
            page.footnote_reserved = 30.0;
        }
        assert!(pages.crosses_page_break(60.0, 80.0, 0.0));
        assert!(!pages.crosses_page_break(40.0, 60.0, 10.0));
        assert!(pages.crosses_page_break(40.0, 65.0, 10.0));
    }

    #[test]
    fn trim_keeps_at_least_one_page() {
        let mut pages = PageSequence::new(masters(100.0), 5, None);
        pages.get_page(450.0, None);
        assert_eq!(pages.trim(2), 3);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages.trim(0), 1);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages.find_page(150.0), None);
    }

    #[test]
    fn next_page_top_creates_following_page() {
        let mut pages = PageSequence::new(masters(100.0), 5, None);
        assert_eq!(pages.next_page_top(10.0, None), 100.0);
        assert_eq!(pages.len(), 2);
    }
}
