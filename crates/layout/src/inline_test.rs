#![cfg(test)]

use crate::nodes::inline::FragmentKind;
use crate::test_utils::{TestDocument, WordMeasurer, block_style};
use flowbox_style::dimension::Dimension;
use flowbox_style::display::{Display, Float};
use flowbox_style::list::ListStylePosition;
use flowbox_style::stylesheet::ElementStyle;
use flowbox_style::text::{Direction, TextAlign, WhiteSpace};
use flowbox_types::{BoxId, LineRef};
use std::sync::Arc;

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn styled(f: impl FnOnce(&mut ElementStyle)) -> ElementStyle {
    let mut style = block_style();
    f(&mut style);
    style
}

fn float_box(doc: &mut TestDocument, parent: BoxId, side: Float, width: f32, height: f32) -> BoxId {
    doc.block_with(
        parent,
        &styled(|s| {
            s.float = Some(side);
            s.width = Some(Dimension::Pt(width));
            s.height = Some(Dimension::Pt(height));
        }),
    )
}

fn footnote(doc: &mut TestDocument, parent: BoxId, marker: &str, lines: usize) -> BoxId {
    let body = doc.block_with(parent, &styled(|s| s.float = Some(Float::Footnote)));
    doc.tree.set_marker(body, marker).unwrap();
    for i in 0..lines {
        if i > 0 {
            doc.line_break(body);
        }
        doc.text(body, "n");
    }
    body
}

#[test]
fn test_text_wraps_at_word_boundaries() {
    let mut doc = TestDocument::new(150.0, 400.0);
    let p = doc.paragraph(doc.root, "The quick brown fox jumps over the lazy dog");

    doc.layout();

    assert_eq!(doc.line_texts(p), vec!["The quick brown fox jumps", "over the lazy dog"]);
    let b = doc.tree.get(p).unwrap();
    assert_close(b.lines[0].y, 0.0);
    assert_close(b.lines[1].y, 14.4);
    assert_close(b.geometry.content_height, 28.8);
}

#[test]
fn test_word_measurer_gives_two_lines() {
    let mut doc = TestDocument::new(150.0, 400.0).with_measurer(Arc::new(WordMeasurer));
    let p = doc.paragraph(doc.root, "The quick brown fox");

    doc.layout();

    assert_eq!(doc.line_texts(p), vec!["The quick", "brown fox"]);
}

#[test]
fn test_white_space_collapses_across_text_boxes() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block(doc.root);
    doc.text(p, "  one   two ");
    doc.text(p, "  three");

    doc.layout();

    assert_eq!(doc.line_texts(p), vec!["one two three"]);
}

#[test]
fn test_pre_keeps_spaces_and_newlines() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block_with(doc.root, &styled(|s| s.white_space = Some(WhiteSpace::Pre)));
    doc.text(p, "a  b\nc");

    doc.layout();

    assert_eq!(doc.line_texts(p), vec!["a  b", "c"]);
    assert!(doc.tree.get(p).unwrap().lines[0].forced_break);
}

#[test]
fn test_line_break_box_forces_new_line() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block(doc.root);
    doc.text(p, "first");
    doc.line_break(p);
    doc.text(p, "second");

    doc.layout();

    let b = doc.tree.get(p).unwrap();
    assert_eq!(doc.line_texts(p), vec!["first", "second"]);
    assert!(b.lines[0].forced_break);
    assert!(!b.lines[1].forced_break);
}

#[test]
fn test_left_float_narrows_only_overlapping_lines() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block(doc.root);
    float_box(&mut doc, p, Float::Left, 100.0, 50.0);
    doc.text(p, &"word ".repeat(40));

    doc.layout();

    let lines = &doc.tree.get(p).unwrap().lines;
    assert!(lines.len() > 4);
    for line in &lines[..4] {
        // Tops at 0, 14.4, 28.8 and 43.2 overlap the float's 0..50.
        assert_close(line.x, 100.0);
        assert_close(line.width, 200.0);
        assert_close(line.fragments[0].x, 100.0);
    }
    assert_close(lines[4].x, 0.0);
    assert_close(lines[4].width, 300.0);
}

#[test]
fn test_rtl_line_is_aligned_against_right_float() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block_with(doc.root, &styled(|s| s.direction = Some(Direction::Rtl)));
    float_box(&mut doc, p, Float::Right, 100.0, 50.0);
    doc.text(p, "abc def");

    doc.layout();

    let line = &doc.tree.get(p).unwrap().lines[0];
    assert_close(line.x, 0.0);
    assert_close(line.width, 200.0);
    let last = line.fragments.last().unwrap();
    assert_close(last.right(), 200.0);
    assert_close(line.fragments[0].x, 200.0 - 42.0);
}

#[test]
fn test_rtl_line_next_to_left_float_ends_at_block_edge() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block_with(doc.root, &styled(|s| s.direction = Some(Direction::Rtl)));
    float_box(&mut doc, p, Float::Left, 100.0, 50.0);
    doc.text(p, "abc def");

    doc.layout();

    let line = &doc.tree.get(p).unwrap().lines[0];
    assert_close(line.x, 100.0);
    assert_close(line.fragments.last().unwrap().right(), 300.0);
}

#[test]
fn test_mixed_direction_runs_are_reordered() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block(doc.root);
    doc.text(p, "abc \u{05D0}\u{05D1} \u{05D2}\u{05D3} def");

    doc.layout();

    let line = &doc.tree.get(p).unwrap().lines[0];
    let directions: Vec<Direction> = line.fragments.iter().map(|f| f.direction).collect();
    assert!(directions.contains(&Direction::Rtl));
    // Fragments are stored in visual order: x only grows.
    for pair in line.fragments.windows(2) {
        assert!(pair[0].x <= pair[1].x);
    }
}

#[test]
fn test_justified_lines_spread_spaces_except_the_last() {
    let mut doc = TestDocument::new(150.0, 400.0);
    let p = doc.block_with(doc.root, &styled(|s| s.text_align = Some(TextAlign::Justify)));
    doc.text(p, "aaaa bbbb cccc dddd eeee ffff");

    doc.layout();

    let lines = &doc.tree.get(p).unwrap().lines;
    assert_eq!(lines.len(), 2);
    assert_close(lines[0].content_width, 150.0);
    assert_close(lines[0].fragments[0].word_spacing, 1.5);
    assert_close(lines[1].content_width, 24.0);
    assert_close(lines[1].fragments[0].word_spacing, 0.0);
}

#[test]
fn test_zero_width_trailing_space_is_trimmed_before_justifying() {
    let mut doc = TestDocument::new(150.0, 400.0).with_measurer(Arc::new(WordMeasurer));
    let p = doc.block_with(doc.root, &styled(|s| s.text_align = Some(TextAlign::Justify)));
    doc.text(p, "aa bb cc dd");

    doc.layout();

    assert_eq!(doc.line_texts(p), vec!["aa bb", "cc dd"]);
    let line = &doc.tree.get(p).unwrap().lines[0];
    assert_close(line.fragments[0].word_spacing, 30.0);
    assert_close(line.content_width, 150.0);
}

#[test]
fn test_centered_and_indented_lines() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let centered = doc.block_with(doc.root, &styled(|s| s.text_align = Some(TextAlign::Center)));
    doc.text(centered, "middle");
    let indented = doc.block_with(doc.root, &styled(|s| s.text_indent = Some(30.0)));
    doc.text(indented, "first");
    doc.line_break(indented);
    doc.text(indented, "second");

    doc.layout();

    let line = &doc.tree.get(centered).unwrap().lines[0];
    assert_close(line.fragments[0].x, (300.0 - 36.0) / 2.0);
    let lines = &doc.tree.get(indented).unwrap().lines;
    assert_close(lines[0].fragments[0].x, 30.0);
    assert_close(lines[1].fragments[0].x, 0.0);
}

#[test]
fn test_first_line_style_applies_to_first_line_only() {
    let mut doc = TestDocument::new(100.0, 400.0);
    let first_line = ElementStyle {
        font_size: Some(24.0),
        ..Default::default()
    };
    let p = doc.block_with(doc.root, &styled(|s| s.first_line = Some(Box::new(first_line))));
    doc.text(p, "aaaa bbbb cccc");

    doc.layout();

    assert_eq!(doc.line_texts(p), vec!["aaaa", "bbbb cccc"]);
    let lines = &doc.tree.get(p).unwrap().lines;
    assert_close(lines[0].fragments[0].width, 48.0);
    assert!(lines[0].height >= 28.8 - 0.01);
    assert_close(lines[1].height, 14.4);
}

#[test]
fn test_first_letter_gets_its_own_fragment() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let first_letter = ElementStyle {
        font_size: Some(24.0),
        ..Default::default()
    };
    let p = doc.block_with(doc.root, &styled(|s| s.first_letter = Some(Box::new(first_letter))));
    doc.text(p, "Hello world");

    doc.layout();

    let line = &doc.tree.get(p).unwrap().lines[0];
    match &line.fragments[0].kind {
        FragmentKind::Text { text, .. } => assert_eq!(&**text, "H"),
        other => panic!("expected text, got {:?}", other),
    }
    assert_close(line.fragments[0].width, 12.0);
    assert_eq!(doc.line_texts(p), vec!["Hello world"]);
}

#[test]
fn test_outside_marker_hangs_before_the_line() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let item = doc.block_with(doc.root, &styled(|s| s.display = Some(Display::ListItem)));
    doc.tree.set_marker(item, "\u{2022}").unwrap();
    doc.text(item, "item");

    doc.layout();

    let line = &doc.tree.get(item).unwrap().lines[0];
    let marker = &line.fragments[0];
    assert!(matches!(marker.kind, FragmentKind::Marker { inside: false, .. }));
    assert_close(marker.x, -6.0);
    assert_close(line.fragments[1].x, 0.0);
}

#[test]
fn test_inside_marker_takes_room_on_first_line() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let item = doc.block_with(
        doc.root,
        &styled(|s| {
            s.display = Some(Display::ListItem);
            s.list_style_position = Some(ListStylePosition::Inside);
        }),
    );
    doc.tree.set_marker(item, "1.").unwrap();
    doc.text(item, "first");
    doc.line_break(item);
    doc.text(item, "second");

    doc.layout();

    let lines = &doc.tree.get(item).unwrap().lines;
    assert!(matches!(lines[0].fragments[0].kind, FragmentKind::Marker { inside: true, .. }));
    assert_close(lines[0].fragments[0].x, 0.0);
    assert_close(lines[0].fragments[1].x, 12.0);
    assert_close(lines[1].fragments[0].x, 0.0);
}

#[test]
fn test_atomic_inline_sits_on_the_baseline() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block(doc.root);
    doc.text(p, "ab");
    let image = doc.replaced(p, 50.0, 30.0, &ElementStyle::default());
    doc.text(p, "cd");

    doc.layout();

    let line = &doc.tree.get(p).unwrap().lines[0];
    assert_close(line.height, 33.6);
    assert_close(line.baseline, 30.0);
    assert_close(line.content_width, 74.0);
    let g = doc.tree.geometry(image).unwrap();
    assert_close(g.abs_x, 12.0);
    assert_close(g.abs_y, 0.0);
}

#[test]
fn test_inline_block_shrinks_to_its_content() {
    let mut doc = TestDocument::new(300.0, 400.0);
    let p = doc.block(doc.root);
    let ib = doc.block_with(p, &styled(|s| s.display = Some(Display::InlineBlock)));
    doc.text(ib, "abc");

    doc.layout();

    let g = doc.tree.geometry(ib).unwrap();
    assert_close(g.content_width, 18.0);
    assert_eq!(doc.line_texts(ib), vec!["abc"]);
}

#[test]
fn test_unbreakable_word_is_forced_out() {
    let mut doc = TestDocument::new(60.0, 400.0);
    let p = doc.paragraph(doc.root, "ok Supercalifragilistic ok");

    let result = doc.layout();

    assert_eq!(doc.line_texts(p), vec!["ok", "Supercalifragilistic", "ok"]);
    assert!(result.stats.forced_line_outputs <= 1);
}

#[test]
fn test_line_crossing_page_moves_to_next_page() {
    let mut doc = TestDocument::new(300.0, 30.0);
    let p = doc.block(doc.root);
    for i in 0..3 {
        if i > 0 {
            doc.line_break(p);
        }
        doc.text(p, "line");
    }

    let result = doc.layout();

    let b = doc.tree.get(p).unwrap();
    assert_close(b.lines[0].y, 0.0);
    assert_close(b.lines[1].y, 14.4);
    assert_close(b.lines[2].y, 30.0);
    assert_eq!(result.page_count(), 2);
    assert_eq!(result.pages[1].lines, vec![LineRef::new(p, 2)]);
}

#[test]
fn test_footnote_is_placed_at_page_bottom() {
    let mut doc = TestDocument::new(300.0, 100.0);
    let p = doc.block(doc.root);
    doc.text(p, "see note");
    let body = footnote(&mut doc, p, "1", 2);

    let result = doc.layout();

    assert_eq!(doc.line_texts(p), vec!["see note"]);
    let line = &doc.tree.get(p).unwrap().lines[0];
    assert_eq!(line.footnotes, vec![body]);
    assert!(line
        .fragments
        .iter()
        .any(|f| matches!(&f.kind, FragmentKind::FootnoteCall { text } if &**text == "1")));

    assert_eq!(result.page_count(), 1);
    let frame = &result.pages[0];
    assert_eq!(frame.footnotes.len(), 1);
    assert_close(frame.footnotes[0].y, 71.2);
    let area = frame.footnote_area.unwrap();
    assert_close(area.y, 71.2);
    assert_close(area.height, 28.8);
    assert_close(doc.tree.geometry(body).unwrap().abs_y, 71.2);
    assert_eq!(result.stats.footnotes_added, 1);
}

#[test]
fn test_footnote_that_no_longer_fits_moves_its_line() {
    let mut doc = TestDocument::new(300.0, 100.0);
    doc.block_with(doc.root, &styled(|s| s.height = Some(Dimension::Pt(60.0))));
    let p = doc.block(doc.root);
    doc.text(p, "see note");
    footnote(&mut doc, p, "1", 2);

    let result = doc.layout();

    let b = doc.tree.get(p).unwrap();
    assert_close(b.geometry.content_origin().y + b.lines[0].y, 100.0);
    assert!(result.pages[0].footnotes.is_empty());
    assert_close(result.pages[1].footnotes[0].y, 200.0 - 28.8);
}

#[test]
fn test_long_footnote_spans_onto_a_fully_reserved_page() {
    let mut doc = TestDocument::new(300.0, 100.0);
    let p = doc.block(doc.root);
    doc.text(p, "see note");
    let body = footnote(&mut doc, p, "1", 6);
    doc.paragraph(doc.root, "after");
    let later = doc.paragraph(doc.root, "later");

    let result = doc.layout();

    // Two lines stay above the footnote area on the anchor page.
    let first = &result.pages[0];
    assert_close(first.footnote_area.unwrap().y, 28.8);
    assert_close(first.footnotes[0].y, 28.8);
    assert_close(doc.tree.geometry(body).unwrap().abs_y, 28.8);
    // The continuation claims the whole of the next page.
    assert_close(result.pages[1].footnote_area.unwrap().height, 100.0);
    assert!(result.pages[1].lines.iter().all(|l| l.block == body));
    assert!(result.pages[2].lines.contains(&LineRef::new(later, 0)));
}
