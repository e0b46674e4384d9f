//! Finds where a run of text ends on the current line.
//!
//! `break_text` is called once per (text run, line) with the width still
//! free on that line. It never loops on its own: when nothing fits it reports
//! why through the flags on `LineBreakContext`, and the inline flow decides
//! whether to start a new line, move below a float, or force the text out.

use crate::style::ComputedStyle;
use flowbox_style::text::{WhiteSpace, WordBreak, WordWrap};
use flowbox_traits::TextBoundary;
use flowbox_types::geometry::EPSILON;
use std::collections::HashMap;
use std::sync::Arc;

const SOFT_HYPHEN: char = '\u{AD}';

/// Cursor over one text run.
///
/// `start..end` is the span chosen by the last `break_text` call. After the
/// caller has placed that span it calls `advance` and breaks again.
#[derive(Debug, Clone)]
pub struct LineBreakContext {
    master: Arc<str>,
    pub start: usize,
    pub end: usize,
    /// Measured width of `start..end`, trailing hanging spaces excluded.
    pub width: f32,
    /// The run continues on a following line.
    pub needs_new_line: bool,
    /// `start..end` is wider than the available width.
    pub unbreakable: bool,
    /// The span ends at a soft hyphen that is rendered as a hyphen.
    pub ends_on_soft_hyphen: bool,
    /// The span ends after a preserved newline.
    pub ends_on_nl: bool,
    /// The span ends inside a word split by `word-wrap: break-word`; the
    /// next line continues in character mode.
    pub finished_in_char_breaking: bool,
    nowrap_deferred: bool,
    /// Word-mode opportunities of `master`, computed on first use.
    word_breaks: Option<Arc<[usize]>>,
}

impl LineBreakContext {
    pub fn new(master: Arc<str>) -> Self {
        Self {
            master,
            start: 0,
            end: 0,
            width: 0.0,
            needs_new_line: false,
            unbreakable: false,
            ends_on_soft_hyphen: false,
            ends_on_nl: false,
            finished_in_char_breaking: false,
            nowrap_deferred: false,
            word_breaks: None,
        }
    }

    pub fn master(&self) -> &str {
        &self.master
    }

    pub fn is_finished(&self) -> bool {
        self.end == self.master.len()
    }

    /// The span chosen by the last call.
    pub fn span(&self) -> &str {
        self.master.get(self.start..self.end).unwrap_or("")
    }

    /// Moves the cursor past the placed span.
    pub fn advance(&mut self) {
        self.start = self.end;
    }

    fn word_breaks(&mut self, boundary: &dyn TextBoundary) -> Arc<[usize]> {
        self.word_breaks
            .get_or_insert_with(|| boundary.word_breaks(&self.master).into())
            .clone()
    }

    fn clear_result(&mut self) {
        self.end = self.start;
        self.width = 0.0;
        self.needs_new_line = false;
        self.unbreakable = false;
        self.ends_on_soft_hyphen = false;
        self.ends_on_nl = false;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakOptions {
    /// Nothing has been placed on the current line yet.
    pub line_is_empty: bool,
    /// Emit at least one unit even if it does not fit.
    pub force_output: bool,
}

/// Counts how often the same text position was pushed to a new line.
#[derive(Debug, Clone)]
pub struct RetryGuard {
    counts: HashMap<(usize, usize), usize>,
    max_retries: usize,
}

impl RetryGuard {
    pub fn new(max_retries: usize) -> Self {
        Self {
            counts: HashMap::new(),
            max_retries,
        }
    }

    /// Records that `(item, offset)` is about to be reconsumed.
    pub fn record_retry(&mut self, item: usize, offset: usize) {
        *self.counts.entry((item, offset)).or_default() += 1;
    }

    /// Whether the next break at `(item, offset)` must force output.
    pub fn must_force(&self, item: usize, offset: usize) -> bool {
        self.counts
            .get(&(item, offset))
            .is_some_and(|c| *c >= self.max_retries)
    }

    pub fn retries(&self, item: usize, offset: usize) -> usize {
        self.counts.get(&(item, offset)).copied().unwrap_or(0)
    }
}

/// Chooses the end of the span starting at `ctx.start` that fits into
/// `available_width`.
///
/// `measure` returns the advance width of a string in the run's font,
/// letter spacing included. A span wider than `available_width` is always
/// flagged `unbreakable`, whichever rule let it out.
pub fn break_text(
    ctx: &mut LineBreakContext,
    available_width: f32,
    style: &ComputedStyle,
    measure: &mut dyn FnMut(&str) -> f32,
    boundary: &dyn TextBoundary,
    options: BreakOptions,
) {
    ctx.clear_result();
    choose_span(ctx, available_width, style, measure, boundary, options);
    if ctx.end > ctx.start && ctx.width > available_width + EPSILON {
        ctx.unbreakable = true;
    }
}

fn choose_span(
    ctx: &mut LineBreakContext,
    available_width: f32,
    style: &ComputedStyle,
    measure: &mut dyn FnMut(&str) -> f32,
    boundary: &dyn TextBoundary,
    options: BreakOptions,
) {
    let len = ctx.master.len();
    if ctx.start >= len {
        ctx.end = len;
        return;
    }
    let white_space = style.text.white_space;
    let master = ctx.master.clone();
    let mut limit = len;

    if white_space.preserves_newlines() {
        if let Some(rel) = master[ctx.start..].find('\n') {
            let nl = ctx.start + rel;
            let width = measure_span(&master, ctx.start, nl, nl, white_space, measure).0;
            if white_space == WhiteSpace::Pre || width <= available_width + EPSILON {
                ctx.end = nl + 1;
                ctx.width = width;
                ctx.ends_on_nl = true;
                ctx.needs_new_line = ctx.end < len;
                return;
            }
            limit = nl;
        }
    }

    if matches!(white_space, WhiteSpace::Nowrap | WhiteSpace::Pre) {
        let (width, _) = measure_span(&master, ctx.start, limit, limit, white_space, measure);
        if width <= available_width + EPSILON
            || options.line_is_empty
            || options.force_output
            || ctx.nowrap_deferred
        {
            ctx.nowrap_deferred = false;
            ctx.end = limit;
            ctx.width = width;
            return;
        }
        // Give the caller one chance to move past floats or start a fresh line.
        ctx.nowrap_deferred = true;
        ctx.needs_new_line = true;
        return;
    }

    break_within(ctx, &master, limit, available_width, style, measure, boundary, options);

    if ctx.end == limit && limit < len {
        ctx.end = limit + 1;
        ctx.ends_on_nl = true;
        ctx.needs_new_line = ctx.end < len;
    }
}

#[allow(clippy::too_many_arguments)]
fn break_within(
    ctx: &mut LineBreakContext,
    master: &str,
    limit: usize,
    available_width: f32,
    style: &ComputedStyle,
    measure: &mut dyn FnMut(&str) -> f32,
    boundary: &dyn TextBoundary,
    options: BreakOptions,
) {
    let start = ctx.start;
    let white_space = style.text.white_space;
    let must_emit = options.line_is_empty || options.force_output;

    if style.text.word_break == WordBreak::BreakAll {
        break_chars(ctx, master, limit, available_width, white_space, measure, boundary, must_emit);
        return;
    }

    let breaks = ctx.word_breaks(boundary);

    if ctx.finished_in_char_breaking {
        let word_end = next_word_break(&breaks, start, limit);
        let (width, _) = measure_span(master, start, word_end, limit, white_space, measure);
        if width > available_width + EPSILON {
            break_chars(ctx, master, word_end, available_width, white_space, measure, boundary, must_emit);
            ctx.finished_in_char_breaking = !ctx.unbreakable && ctx.end < word_end;
            return;
        }
        ctx.finished_in_char_breaking = false;
    }

    let mut best: Option<(usize, f32, bool)> = None;
    let mut first_opportunity: Option<usize> = None;
    let mut pos = start;
    loop {
        let next = next_word_break(&breaks, pos, limit);
        if next <= pos {
            break;
        }
        first_opportunity.get_or_insert(next);
        let (width, hyphenated) = measure_span(master, start, next, limit, white_space, measure);
        if width > available_width + EPSILON {
            break;
        }
        best = Some((next, width, hyphenated));
        if next >= limit {
            break;
        }
        pos = next;
    }

    if let Some((end, width, hyphenated)) = best {
        ctx.end = end;
        ctx.width = width;
        ctx.ends_on_soft_hyphen = hyphenated;
        ctx.needs_new_line = end < master.len();
        return;
    }

    let word_end = first_opportunity.unwrap_or(limit);
    if style.text.word_wrap == WordWrap::BreakWord && must_emit {
        break_chars(ctx, master, word_end, available_width, white_space, measure, boundary, true);
        ctx.finished_in_char_breaking = ctx.end < word_end;
        ctx.needs_new_line = ctx.end < master.len();
        return;
    }

    let (width, hyphenated) = measure_span(master, start, word_end, limit, white_space, measure);
    ctx.end = word_end;
    ctx.width = width;
    ctx.ends_on_soft_hyphen = hyphenated;
    ctx.needs_new_line = word_end < master.len();
    ctx.unbreakable = !options.force_output;
}

/// Character mode: the furthest grapheme boundary up to `limit` that fits.
#[allow(clippy::too_many_arguments)]
fn break_chars(
    ctx: &mut LineBreakContext,
    master: &str,
    limit: usize,
    available_width: f32,
    white_space: WhiteSpace,
    measure: &mut dyn FnMut(&str) -> f32,
    boundary: &dyn TextBoundary,
    must_emit: bool,
) {
    let start = ctx.start;
    let mut best: Option<(usize, f32)> = None;
    let mut first: Option<usize> = None;
    let mut pos = start;
    while let Some(next) = boundary.next_char_break(master, pos) {
        let next = next.min(limit);
        if next <= pos {
            break;
        }
        first.get_or_insert(next);
        let (width, _) = measure_span(master, start, next, limit, white_space, measure);
        if width > available_width + EPSILON {
            break;
        }
        best = Some((next, width));
        if next >= limit {
            break;
        }
        pos = next;
    }

    match best {
        Some((end, width)) => {
            ctx.end = end;
            ctx.width = width;
        }
        None => {
            let end = first.unwrap_or(limit);
            ctx.end = end;
            ctx.width = measure_span(master, start, end, limit, white_space, measure).0;
            ctx.unbreakable = !must_emit;
        }
    }
    ctx.needs_new_line = ctx.end < master.len();
}

fn next_word_break(breaks: &[usize], from: usize, limit: usize) -> usize {
    let index = breaks.partition_point(|&b| b <= from);
    breaks.get(index).map(|&n| n.min(limit)).unwrap_or(limit)
}

/// Width of `start..end` as it would appear at the end of a line: trailing
/// collapsible spaces hang, and a soft hyphen before `limit` is rendered.
fn measure_span(
    master: &str,
    start: usize,
    end: usize,
    limit: usize,
    white_space: WhiteSpace,
    measure: &mut dyn FnMut(&str) -> f32,
) -> (f32, bool) {
    let segment = &master[start..end];
    if end < limit && segment.ends_with(SOFT_HYPHEN) {
        let mut shown = segment.trim_end_matches(SOFT_HYPHEN).to_string();
        shown.push('-');
        return (measure(&shown), true);
    }
    let visible = if white_space.collapses_spaces() {
        segment.trim_end_matches(' ')
    } else {
        segment
    };
    (measure(visible), false)
}
