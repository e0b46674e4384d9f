//! Flattening of a block's inline-level descendants into a sequence of
//! items the line loop consumes.

use crate::LayoutError;
use crate::interface::LayoutContext;
use crate::style::ComputedStyle;
use crate::tree::BoxKind;
use flowbox_style::text::{Direction, WhiteSpace};
use flowbox_traits::{BidiSplitter, TextBoundary};
use flowbox_types::BoxId;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum InlineItem {
    Start {
        id: BoxId,
        edge: f32,
        style: Arc<ComputedStyle>,
    },
    End {
        id: BoxId,
        edge: f32,
        style: Arc<ComputedStyle>,
    },
    /// One directional run of a text box. `offset` is where `text` starts
    /// in the box's processed text.
    Text {
        id: BoxId,
        text: Arc<str>,
        offset: usize,
        direction: Direction,
        style: Arc<ComputedStyle>,
        first_letter: bool,
    },
    Atomic {
        id: BoxId,
    },
    Float {
        id: BoxId,
    },
    Absolute {
        id: BoxId,
    },
    LineBreak {
        id: BoxId,
        style: Arc<ComputedStyle>,
    },
    FootnoteCall {
        body: BoxId,
        text: Arc<str>,
        style: Arc<ComputedStyle>,
    },
}

/// Collects the inline items of `block`, in logical order.
pub fn collect_items(ctx: &LayoutContext, block: BoxId) -> Result<Vec<InlineItem>, LayoutError> {
    let style = ctx.tree.style(block)?;
    let mut collector = Collector {
        items: Vec::new(),
        base: style.text.direction,
        after_space: true,
        paragraph: String::new(),
        text_starts: Vec::new(),
    };
    for child in ctx.tree.children(block)? {
        collector.visit(ctx, child, &style)?;
    }
    Ok(collector.split_runs(ctx.services.bidi.as_deref()))
}

/// Stands in for atomic inlines in the paragraph text given to the bidi
/// splitter.
const OBJECT_REPLACEMENT: char = '\u{FFFC}';

struct Collector {
    items: Vec<InlineItem>,
    base: Direction,
    /// The last content emitted was a collapsible space (or nothing yet).
    after_space: bool,
    /// Processed text of the whole block, for paragraph-level bidi.
    paragraph: String,
    /// Index of each text item and where its text starts in `paragraph`.
    text_starts: Vec<(usize, usize)>,
}

impl Collector {
    fn visit(&mut self, ctx: &LayoutContext, id: BoxId, parent_style: &Arc<ComputedStyle>) -> Result<(), LayoutError> {
        let b = ctx.tree.get(id)?;
        if !b.is_displayed() {
            return Ok(());
        }
        let style = b.style.clone();
        if style.is_footnote() {
            let text = b.marker.clone().unwrap_or_else(|| Arc::from("*"));
            self.items.push(InlineItem::FootnoteCall {
                body: id,
                text,
                style: parent_style.clone(),
            });
            self.paragraph.push(OBJECT_REPLACEMENT);
            self.after_space = false;
            return Ok(());
        }
        if style.is_floated() {
            self.items.push(InlineItem::Float { id });
            return Ok(());
        }
        if style.is_out_of_flow_positioned() {
            self.items.push(InlineItem::Absolute { id });
            return Ok(());
        }
        match &b.kind {
            BoxKind::Text(text) => self.push_text(id, text, style),
            BoxKind::LineBreak => {
                self.items.push(InlineItem::LineBreak { id, style });
                self.paragraph.push('\u{2028}');
                self.after_space = true;
            }
            BoxKind::Replaced(_) | BoxKind::Block => {
                self.items.push(InlineItem::Atomic { id });
                self.paragraph.push(OBJECT_REPLACEMENT);
                self.after_space = false;
            }
            BoxKind::Inline => {
                let start = style.box_model.margin.left + style.box_model.border.left + style.box_model.padding.left;
                let end = style.box_model.margin.right + style.box_model.border.right + style.box_model.padding.right;
                self.items.push(InlineItem::Start {
                    id,
                    edge: start,
                    style: style.clone(),
                });
                for child in &b.children {
                    self.visit(ctx, *child, &style)?;
                }
                self.items.push(InlineItem::End { id, edge: end, style });
            }
        }
        Ok(())
    }

    fn push_text(&mut self, id: BoxId, text: &str, style: Arc<ComputedStyle>) {
        let processed = collapse_white_space(text, style.text.white_space, &mut self.after_space);
        if processed.is_empty() {
            return;
        }
        self.text_starts.push((self.items.len(), self.paragraph.len()));
        self.paragraph.push_str(&processed);
        self.items.push(InlineItem::Text {
            id,
            text: Arc::from(processed),
            offset: 0,
            direction: Direction::Ltr,
            style,
            first_letter: false,
        });
    }

    /// Splits the whole paragraph into directional runs once and cuts each
    /// text item at the run boundaries inside it. Without a splitter every
    /// text box stays one LTR item.
    fn split_runs(self, splitter: Option<&dyn BidiSplitter>) -> Vec<InlineItem> {
        let Some(splitter) = splitter else {
            return self.items;
        };
        let runs = splitter.split(&self.paragraph, self.base);
        let mut out = Vec::with_capacity(self.items.len() + runs.len());
        let mut starts = self.text_starts.into_iter().peekable();
        let mut run_index = 0;

        for (index, item) in self.items.into_iter().enumerate() {
            let para_start = match starts.peek() {
                Some(&(i, start)) if i == index => {
                    starts.next();
                    start
                }
                _ => {
                    out.push(item);
                    continue;
                }
            };
            let InlineItem::Text { id, text, style, .. } = &item else {
                out.push(item);
                continue;
            };
            let para_end = para_start + text.len();
            while runs.get(run_index).is_some_and(|r| r.end() <= para_start) {
                run_index += 1;
            }
            let before = out.len();
            for run in runs[run_index.min(runs.len())..]
                .iter()
                .take_while(|r| r.start < para_end)
            {
                let from = run.start.max(para_start) - para_start;
                let to = run.end().min(para_end) - para_start;
                let Some(slice) = text.get(from..to) else {
                    continue;
                };
                out.push(InlineItem::Text {
                    id: *id,
                    text: Arc::from(slice),
                    offset: from,
                    direction: run.direction,
                    style: style.clone(),
                    first_letter: false,
                });
            }
            if out.len() == before {
                out.push(item);
            }
        }
        out
    }
}

/// Applies `white-space` processing to one text box. `after_space` carries
/// whether the preceding content ended in a collapsible space.
pub fn collapse_white_space(text: &str, white_space: WhiteSpace, after_space: &mut bool) -> String {
    if !white_space.collapses_spaces() {
        *after_space = false;
        return text.to_string();
    }
    let keep_newlines = white_space == WhiteSpace::PreLine;
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\n' && keep_newlines {
            while out.ends_with(' ') {
                out.pop();
            }
            out.push('\n');
            *after_space = true;
        } else if ch.is_whitespace() && ch != '\u{A0}' {
            if !*after_space {
                out.push(' ');
                *after_space = true;
            }
        } else {
            out.push(ch);
            *after_space = false;
        }
    }
    out
}

/// Splits the first grapheme of the first text item off into its own item
/// marked for `::first-letter` styling.
pub fn split_first_letter(items: &mut Vec<InlineItem>, boundary: &dyn TextBoundary) {
    let Some(index) = items
        .iter()
        .position(|item| matches!(item, InlineItem::Text { text, .. } if !text.trim().is_empty()))
    else {
        return;
    };
    let InlineItem::Text {
        id,
        text,
        offset,
        direction,
        style,
        ..
    } = items[index].clone()
    else {
        return;
    };
    let lead = text.len() - text.trim_start().len();
    let Some(split) = boundary.next_char_break(&text, lead) else {
        return;
    };
    let (head, tail) = text.split_at(split);
    let first = InlineItem::Text {
        id,
        text: Arc::from(head),
        offset,
        direction,
        style: style.clone(),
        first_letter: true,
    };
    items[index] = first;
    if !tail.is_empty() {
        items.insert(
            index + 1,
            InlineItem::Text {
                id,
                text: Arc::from(tail),
                offset: offset + split,
                direction,
                style,
                first_letter: false,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDocument;
    use crate::text::UnicodeBoundary;

    fn text_runs(items: &[InlineItem]) -> Vec<(String, usize, Direction)> {
        items
            .iter()
            .filter_map(|item| match item {
                InlineItem::Text {
                    text, offset, direction, ..
                } => Some((text.to_string(), *offset, *direction)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn bidi_runs_are_resolved_across_text_boxes() {
        let mut doc = TestDocument::new(300.0, 400.0);
        let p = doc.block(doc.root);
        doc.text(p, "abc \u{5D0} ");
        doc.text(p, "\u{5D1} def");

        let items = doc.with_context_ref(|ctx| collect_items(ctx, p)).unwrap();

        // The space between the two Hebrew letters sits between strong RTL
        // neighbours only when both boxes are seen together.
        assert_eq!(
            text_runs(&items),
            vec![
                ("abc ".to_string(), 0, Direction::Ltr),
                ("\u{5D0} ".to_string(), 4, Direction::Rtl),
                ("\u{5D1}".to_string(), 0, Direction::Rtl),
                (" def".to_string(), 2, Direction::Ltr),
            ]
        );
    }

    #[test]
    fn without_a_splitter_each_text_box_is_one_ltr_item() {
        let mut doc = TestDocument::new(300.0, 400.0);
        doc.services.bidi = None;
        let p = doc.block(doc.root);
        doc.text(p, "abc \u{5D0} ");
        doc.text(p, "\u{5D1} def");

        let items = doc.with_context_ref(|ctx| collect_items(ctx, p)).unwrap();

        assert_eq!(
            text_runs(&items),
            vec![
                ("abc \u{5D0} ".to_string(), 0, Direction::Ltr),
                ("\u{5D1} def".to_string(), 0, Direction::Ltr),
            ]
        );
    }

    #[test]
    fn normal_white_space_collapses_runs_and_newlines() {
        let mut after_space = true;
        let out = collapse_white_space("  Hello \n\t world ", WhiteSpace::Normal, &mut after_space);
        assert_eq!(out, "Hello world ");
        assert!(after_space);
    }

    #[test]
    fn pre_line_keeps_newlines() {
        let mut after_space = false;
        let out = collapse_white_space("a  \n  b", WhiteSpace::PreLine, &mut after_space);
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn pre_is_untouched() {
        let mut after_space = true;
        let out = collapse_white_space("  a\n b", WhiteSpace::Pre, &mut after_space);
        assert_eq!(out, "  a\n b");
    }

    #[test]
    fn first_letter_is_split_off() {
        let style = crate::style::get_default_style();
        let mut items = vec![InlineItem::Text {
            id: BoxId::new(1),
            text: Arc::from("Once upon"),
            offset: 0,
            direction: Direction::Ltr,
            style,
            first_letter: false,
        }];
        split_first_letter(&mut items, &UnicodeBoundary);
        assert_eq!(items.len(), 2);
        match (&items[0], &items[1]) {
            (
                InlineItem::Text {
                    text: a, first_letter: true, ..
                },
                InlineItem::Text { text: b, offset, .. },
            ) => {
                assert_eq!(&**a, "O");
                assert_eq!(&**b, "nce upon");
                assert_eq!(*offset, 1);
            }
            other => panic!("unexpected items: {:?}", other),
        }
    }
}
