//! Min-content and max-content widths, for shrink-to-fit sizing of floats,
//! inline-blocks and absolutely positioned boxes.

use crate::LayoutError;
use crate::interface::LayoutContext;
use crate::tree::BoxKind;
use flowbox_style::dimension::Dimension;
use flowbox_style::text::WhiteSpace;
use flowbox_types::BoxId;

/// Intrinsic widths of a box's content box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntrinsicWidths {
    pub min: f32,
    pub max: f32,
}

impl IntrinsicWidths {
    fn fixed(width: f32) -> Self {
        Self {
            min: width,
            max: width,
        }
    }

    fn grow(&mut self, by: f32) {
        self.min += by;
        self.max += by;
    }
}

/// `min(max(min-content, available), max-content)`.
pub fn shrink_to_fit(ctx: &mut LayoutContext, id: BoxId, available: f32) -> Result<f32, LayoutError> {
    let widths = content_widths(ctx, id)?;
    Ok(widths.min.max(available).min(widths.max).max(0.0))
}

/// Intrinsic widths of the content box of `id`.
pub fn content_widths(ctx: &mut LayoutContext, id: BoxId) -> Result<IntrinsicWidths, LayoutError> {
    let b = ctx.tree.get(id)?;
    let style = b.style.clone();
    if let Some(Dimension::Pt(w)) = style.box_model.width {
        return Ok(IntrinsicWidths::fixed(w));
    }
    match b.kind.clone() {
        BoxKind::Replaced(size) => Ok(IntrinsicWidths::fixed(size.width)),
        BoxKind::Text(_) | BoxKind::LineBreak | BoxKind::Inline => {
            let mut acc = InlineAccumulator::default();
            inline_contribution(ctx, id, &mut acc)?;
            Ok(acc.finish())
        }
        BoxKind::Block => {
            if ctx.tree.has_inline_children(id)? {
                let mut acc = InlineAccumulator::default();
                for child in ctx.tree.children(id)? {
                    inline_contribution(ctx, child, &mut acc)?;
                }
                Ok(acc.finish())
            } else {
                let mut widths = IntrinsicWidths::default();
                for child in ctx.tree.children(id)? {
                    let c = ctx.tree.get(child)?;
                    if !c.is_displayed() || c.style.is_out_of_flow_positioned() {
                        continue;
                    }
                    let child_widths = outer_widths(ctx, child)?;
                    widths.min = widths.min.max(child_widths.min);
                    widths.max = widths.max.max(child_widths.max);
                }
                Ok(widths)
            }
        }
    }
}

/// Widths of the margin box of `id`.
pub fn outer_widths(ctx: &mut LayoutContext, id: BoxId) -> Result<IntrinsicWidths, LayoutError> {
    let style = ctx.tree.style(id)?;
    let mut widths = content_widths(ctx, id)?;
    widths.grow(style.margin_edges().horizontal() + style.padding_x() + style.border_x());
    Ok(widths)
}

/// Running min/max over a sequence of inline content.
#[derive(Default)]
struct InlineAccumulator {
    min: f32,
    max: f32,
    /// Width of the current line when nothing wraps.
    line: f32,
    /// Width of the unbreakable piece being built across items.
    piece: f32,
}

impl InlineAccumulator {
    fn add_unbreakable(&mut self, width: f32) {
        self.piece += width;
        self.line += width;
        self.min = self.min.max(self.piece);
    }

    fn soft_break(&mut self) {
        self.piece = 0.0;
    }

    fn hard_break(&mut self) {
        self.max = self.max.max(self.line);
        self.line = 0.0;
        self.piece = 0.0;
    }

    fn finish(mut self) -> IntrinsicWidths {
        self.hard_break();
        IntrinsicWidths {
            min: self.min,
            max: self.max,
        }
    }
}

fn inline_contribution(ctx: &mut LayoutContext, id: BoxId, acc: &mut InlineAccumulator) -> Result<(), LayoutError> {
    let b = ctx.tree.get(id)?;
    if !b.is_displayed() || b.style.is_out_of_flow_positioned() || b.style.is_footnote() {
        return Ok(());
    }
    let style = b.style.clone();
    let kind = b.kind.clone();
    if style.is_floated() {
        let widths = outer_widths(ctx, id)?;
        acc.min = acc.min.max(widths.min);
        acc.line += widths.max;
        return Ok(());
    }
    match kind {
        BoxKind::Text(text) => {
            let white_space = style.text.white_space;
            let boundary = ctx.services.boundary.clone();
            for (index, line) in text.split('\n').enumerate() {
                if index > 0 && white_space.preserves_newlines() {
                    acc.hard_break();
                }
                let breaks = if matches!(white_space, WhiteSpace::Nowrap | WhiteSpace::Pre) {
                    Vec::new()
                } else {
                    boundary.word_breaks(line)
                };
                let mut pos = 0;
                for next in breaks.into_iter().chain(std::iter::once(line.len())) {
                    if next <= pos {
                        continue;
                    }
                    let Some(word) = line.get(pos..next) else {
                        break;
                    };
                    let trimmed = word.trim_end_matches(' ');
                    let width = ctx.measure_text(&style, trimmed);
                    acc.add_unbreakable(width);
                    if trimmed.len() < word.len() {
                        acc.line += ctx.measure_text(&style, &word[trimmed.len()..]);
                        acc.soft_break();
                    }
                    pos = next;
                }
            }
        }
        BoxKind::LineBreak => acc.hard_break(),
        BoxKind::Replaced(_) | BoxKind::Block => {
            let widths = outer_widths(ctx, id)?;
            acc.soft_break();
            acc.min = acc.min.max(widths.min);
            acc.line += widths.max;
        }
        BoxKind::Inline => {
            let edges = style.margin_edges().left + style.border_edges().left + style.padding_edges().left;
            acc.add_unbreakable(edges);
            for child in ctx.tree.children(id)? {
                inline_contribution(ctx, child, acc)?;
            }
            let edges = style.margin_edges().right + style.border_edges().right + style.padding_edges().right;
            acc.add_unbreakable(edges);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDocument;
    use flowbox_style::display::Display;
    use flowbox_style::stylesheet::ElementStyle;

    #[test]
    fn text_min_is_widest_word_and_max_is_whole_line() {
        let mut doc = TestDocument::new(300.0, 400.0);
        let p = doc.block(doc.root);
        doc.text(p, "The quick brown fox");
        doc.with_context(|ctx| {
            let widths = content_widths(ctx, p).unwrap();
            // 6pt per character at 12pt.
            assert_eq!(widths.min, 5.0 * 6.0);
            assert_eq!(widths.max, 19.0 * 6.0);
            assert_eq!(shrink_to_fit(ctx, p, 50.0).unwrap(), 50.0);
            assert_eq!(shrink_to_fit(ctx, p, 10.0).unwrap(), 30.0);
            assert_eq!(shrink_to_fit(ctx, p, 500.0).unwrap(), 114.0);
        });
    }

    #[test]
    fn explicit_width_is_both_min_and_max() {
        let mut doc = TestDocument::new(300.0, 400.0);
        let style = ElementStyle {
            display: Some(Display::Block),
            width: Some(Dimension::Pt(80.0)),
            ..Default::default()
        };
        let b = doc.block_with(doc.root, &style);
        doc.text(b, "Hello world");
        doc.with_context(|ctx| {
            assert_eq!(content_widths(ctx, b).unwrap(), IntrinsicWidths::fixed(80.0));
        });
    }

    #[test]
    fn line_break_splits_max_content() {
        let mut doc = TestDocument::new(300.0, 400.0);
        let p = doc.block(doc.root);
        doc.text(p, "aaaa");
        doc.line_break(p);
        doc.text(p, "bb");
        doc.with_context(|ctx| {
            let widths = content_widths(ctx, p).unwrap();
            assert_eq!(widths.max, 24.0);
            assert_eq!(widths.min, 24.0);
        });
    }
}
