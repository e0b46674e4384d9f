//! Visual ordering and horizontal placement of a line's fragments.

use super::line_box::{FragmentKind, InlineFragment};
use flowbox_style::text::{Direction, TextAlign};

/// The horizontal space of one line, relative to the block's content left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineWindow {
    pub left: f32,
    pub width: f32,
    /// Space kept free at the start side (text-indent, inside marker).
    pub start_reserve: f32,
    pub direction: Direction,
    /// Already resolved against the direction: never `Start`/`End`.
    pub align: TextAlign,
    /// Whether `text-align: justify` may stretch this line.
    pub justify: bool,
}

impl LineWindow {
    /// Left and width of the area fragments are placed in.
    fn content_area(&self) -> (f32, f32) {
        let width = (self.width - self.start_reserve).max(0.0);
        if self.direction.is_rtl() {
            (self.left, width)
        } else {
            (self.left + self.start_reserve, width)
        }
    }
}

/// Embedding level of a fragment: text runs carry their direction, every
/// other fragment takes the paragraph's.
fn level(fragment: &InlineFragment, base: Direction) -> u8 {
    let direction = if fragment.is_text() { fragment.direction } else { base };
    match (base, direction) {
        (Direction::Ltr, Direction::Ltr) => 0,
        (Direction::Ltr, Direction::Rtl) => 1,
        (Direction::Rtl, Direction::Rtl) => 1,
        (Direction::Rtl, Direction::Ltr) => 2,
    }
}

/// Reorders `fragments` from logical to visual order (rule L2 of UAX #9):
/// from the highest level down to the lowest odd level, every maximal
/// sequence at that level or above is reversed.
pub fn reorder(fragments: &mut [InlineFragment], base: Direction) {
    let levels: Vec<u8> = fragments.iter().map(|f| level(f, base)).collect();
    let Some(&highest) = levels.iter().max() else {
        return;
    };
    let lowest_odd = levels.iter().copied().filter(|l| l % 2 == 1).min().unwrap_or(highest + 1);
    let mut order: Vec<usize> = (0..fragments.len()).collect();
    let mut current = levels.clone();
    let mut level = highest;
    while level >= lowest_odd && level > 0 {
        let mut i = 0;
        while i < order.len() {
            if current[i] >= level {
                let start = i;
                while i < order.len() && current[i] >= level {
                    i += 1;
                }
                order[start..i].reverse();
                current[start..i].reverse();
            } else {
                i += 1;
            }
        }
        level -= 1;
    }
    let original = fragments.to_vec();
    for (slot, index) in order.into_iter().enumerate() {
        fragments[slot] = original[index].clone();
    }
}

fn space_count(fragment: &InlineFragment) -> usize {
    match &fragment.kind {
        FragmentKind::Text { text, .. } => text.chars().filter(|c| *c == ' ').count(),
        _ => 0,
    }
}

/// Places fragments (already in visual order) inside the window and
/// returns the width they occupy.
pub fn place_fragments(fragments: &mut [InlineFragment], window: &LineWindow) -> f32 {
    let (area_left, area_width) = window.content_area();
    let mut used: f32 = fragments.iter().map(|f| f.width).sum();
    let free = area_width - used;
    let rtl = window.direction.is_rtl();

    let mut offset = match window.align {
        _ if free < 0.0 => {
            if rtl {
                free
            } else {
                0.0
            }
        }
        TextAlign::Justify if window.justify => 0.0,
        TextAlign::Justify | TextAlign::Start | TextAlign::End => {
            if rtl {
                free
            } else {
                0.0
            }
        }
        TextAlign::Left => 0.0,
        TextAlign::Right => free,
        TextAlign::Center => free / 2.0,
    };

    if window.align == TextAlign::Justify && window.justify && free > 0.0 {
        let spaces: usize = fragments.iter().map(space_count).sum();
        if spaces > 0 {
            let word_spacing = free / spaces as f32;
            for fragment in fragments.iter_mut() {
                let n = space_count(fragment);
                if n > 0 {
                    fragment.word_spacing = word_spacing;
                    fragment.width += word_spacing * n as f32;
                }
            }
            used = area_width;
        } else if rtl {
            offset = free;
        }
    }

    let mut x = area_left + offset;
    for fragment in fragments.iter_mut() {
        fragment.x = x;
        x += fragment.width;
    }
    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::get_default_style;
    use flowbox_types::BoxId;
    use std::sync::Arc;

    fn text(label: &str, width: f32, direction: Direction) -> InlineFragment {
        InlineFragment::new(
            BoxId::new(1),
            FragmentKind::Text {
                text: Arc::from(label),
                start: 0,
                end: label.len(),
                hyphenated: false,
            },
            width,
            direction,
            get_default_style(),
        )
    }

    fn labels(fragments: &[InlineFragment]) -> Vec<String> {
        fragments
            .iter()
            .map(|f| match &f.kind {
                FragmentKind::Text { text, .. } => text.to_string(),
                _ => String::new(),
            })
            .collect()
    }

    fn window(align: TextAlign, direction: Direction, justify: bool) -> LineWindow {
        LineWindow {
            left: 0.0,
            width: 100.0,
            start_reserve: 0.0,
            direction,
            align,
            justify,
        }
    }

    #[test]
    fn rtl_runs_inside_ltr_are_reversed() {
        let mut fragments = vec![
            text("a", 10.0, Direction::Ltr),
            text("b", 10.0, Direction::Rtl),
            text("c", 10.0, Direction::Rtl),
            text("d", 10.0, Direction::Ltr),
        ];
        reorder(&mut fragments, Direction::Ltr);
        assert_eq!(labels(&fragments), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn rtl_paragraph_reverses_all_but_keeps_ltr_runs_in_order() {
        let mut fragments = vec![
            text("a", 10.0, Direction::Rtl),
            text("b", 10.0, Direction::Ltr),
            text("c", 10.0, Direction::Ltr),
            text("d", 10.0, Direction::Rtl),
        ];
        reorder(&mut fragments, Direction::Rtl);
        assert_eq!(labels(&fragments), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn alignment_offsets() {
        let mut fragments = vec![text("a", 40.0, Direction::Ltr)];
        place_fragments(&mut fragments, &window(TextAlign::Right, Direction::Ltr, false));
        assert_eq!(fragments[0].x, 60.0);
        place_fragments(&mut fragments, &window(TextAlign::Center, Direction::Ltr, false));
        assert_eq!(fragments[0].x, 30.0);
        place_fragments(&mut fragments, &window(TextAlign::Start, Direction::Rtl, false));
        assert_eq!(fragments[0].x, 60.0);
    }

    #[test]
    fn justify_spreads_free_space_over_spaces() {
        let mut fragments = vec![text("a b", 30.0, Direction::Ltr), text("c d", 30.0, Direction::Ltr)];
        let used = place_fragments(&mut fragments, &window(TextAlign::Justify, Direction::Ltr, true));
        assert_eq!(used, 100.0);
        assert_eq!(fragments[0].word_spacing, 20.0);
        assert_eq!(fragments[1].x, 50.0);
    }

    #[test]
    fn last_line_is_not_justified() {
        let mut fragments = vec![text("a b", 30.0, Direction::Ltr)];
        let used = place_fragments(&mut fragments, &window(TextAlign::Justify, Direction::Ltr, false));
        assert_eq!(used, 30.0);
        assert_eq!(fragments[0].x, 0.0);
        assert_eq!(fragments[0].word_spacing, 0.0);
    }
}
