//! Vertical alignment within a line box.

use super::line_box::{FragmentKind, InlineFragment};
use crate::interface::LayoutContext;
use crate::style::ComputedStyle;
use flowbox_style::text::VerticalAlign;
use flowbox_traits::FontMetrics;

/// Height and baseline of a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub height: f32,
    pub baseline: f32,
}

/// Extent of one fragment's layout box relative to the baseline, Y down.
#[derive(Debug, Clone, Copy)]
struct Extent {
    top: f32,
    bottom: f32,
    /// Where the fragment's own `y` lies below `top`.
    inset: f32,
}

impl Extent {
    fn height(&self) -> f32 {
        self.bottom - self.top
    }

    fn shifted(self, dy: f32) -> Self {
        Self {
            top: self.top + dy,
            bottom: self.bottom + dy,
            ..self
        }
    }
}

fn text_extent(metrics: &FontMetrics, line_height: f32) -> Extent {
    let half_leading = (line_height - metrics.height()) / 2.0;
    Extent {
        top: -(metrics.ascent + half_leading),
        bottom: metrics.descent + half_leading,
        inset: half_leading,
    }
}

/// Sets `y` and `height` of every fragment and returns the line metrics.
/// The block's strut takes part like an empty text fragment.
pub fn align_line(ctx: &LayoutContext, strut_style: &ComputedStyle, fragments: &mut [InlineFragment]) -> LineMetrics {
    let strut_metrics = ctx.metrics(strut_style);
    let strut = text_extent(&strut_metrics, strut_style.text.line_height);

    let mut min_top = strut.top;
    let mut max_bottom = strut.bottom;
    let mut extents = Vec::with_capacity(fragments.len());
    let mut line_relative = Vec::new();

    for (index, fragment) in fragments.iter_mut().enumerate() {
        let style = fragment.style.clone();
        let extent = match fragment.kind {
            FragmentKind::Atomic => Extent {
                top: -fragment.height,
                bottom: 0.0,
                inset: 0.0,
            },
            _ => {
                let metrics = ctx.metrics(&style);
                fragment.height = metrics.height();
                text_extent(&metrics, style.text.line_height)
            }
        };
        let align = style.flow.vertical_align;
        if align.is_line_relative() {
            line_relative.push((index, align));
            extents.push(extent);
            continue;
        }
        let font_size = style.text.font_size;
        let shift = match align {
            VerticalAlign::Baseline | VerticalAlign::Top | VerticalAlign::Bottom => 0.0,
            VerticalAlign::Sub => 0.2 * font_size,
            VerticalAlign::Super => -0.4 * font_size,
            VerticalAlign::Middle => -(strut_metrics.x_height / 2.0) - (extent.top + extent.bottom) / 2.0,
            VerticalAlign::TextTop => -strut_metrics.ascent - extent.top,
            VerticalAlign::TextBottom => strut_metrics.descent - extent.bottom,
            VerticalAlign::Length(v) => -v,
            VerticalAlign::Percent(p) => -(p / 100.0) * style.text.line_height,
        };
        let extent = extent.shifted(shift);
        min_top = min_top.min(extent.top);
        max_bottom = max_bottom.max(extent.bottom);
        extents.push(extent);
    }

    let mut height = max_bottom - min_top;
    let mut baseline = -min_top;
    for (index, align) in &line_relative {
        let h = extents[*index].height();
        match align {
            VerticalAlign::Top => height = height.max(h),
            _ => {
                if h > height {
                    baseline += h - height;
                    height = h;
                }
            }
        }
    }

    for (index, fragment) in fragments.iter_mut().enumerate() {
        let extent = extents[index];
        let top = match line_relative.iter().find(|(i, _)| *i == index) {
            Some((_, VerticalAlign::Top)) => 0.0,
            Some(_) => height - extent.height(),
            None => baseline + extent.top,
        };
        fragment.y = top + extent.inset;
    }

    LineMetrics { height, baseline }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDocument;
    use flowbox_style::stylesheet::ElementStyle;
    use flowbox_style::text::Direction;
    use flowbox_types::BoxId;
    use std::sync::Arc;

    fn fragment(style: Arc<ComputedStyle>, kind: FragmentKind, height: f32) -> InlineFragment {
        let mut f = InlineFragment::new(BoxId::new(1), kind, 10.0, Direction::Ltr, style);
        f.height = height;
        f
    }

    fn text_kind() -> FragmentKind {
        FragmentKind::Text {
            text: Arc::from("x"),
            start: 0,
            end: 1,
            hyphenated: false,
        }
    }

    #[test]
    fn strut_alone_gives_line_height() {
        let doc = TestDocument::new(300.0, 400.0);
        let style = doc.style(&ElementStyle::default());
        doc.with_context_ref(|ctx| {
            let m = align_line(ctx, &style, &mut []);
            // 12pt font, 14.4pt line height: ascent 9.6 plus half-leading 1.2.
            assert!((m.height - 14.4).abs() < 0.01);
            assert!((m.baseline - 10.8).abs() < 0.01);
        });
    }

    #[test]
    fn tall_atomic_raises_the_baseline() {
        let doc = TestDocument::new(300.0, 400.0);
        let style = doc.style(&ElementStyle::default());
        doc.with_context_ref(|ctx| {
            let mut fragments = vec![fragment(style.clone(), FragmentKind::Atomic, 40.0), fragment(style.clone(), text_kind(), 0.0)];
            let m = align_line(ctx, &style, &mut fragments);
            assert!((m.baseline - 40.0).abs() < 0.01);
            assert!((m.height - 43.6).abs() < 0.01);
            assert!(fragments[0].y.abs() < 0.01);
            // Em box top: baseline minus ascent.
            assert!((fragments[1].y - 30.4).abs() < 0.01);
        });
    }

    #[test]
    fn super_raises_and_sub_lowers() {
        let doc = TestDocument::new(300.0, 400.0);
        let base = doc.style(&ElementStyle::default());
        let sup = doc.style(&ElementStyle {
            vertical_align: Some(VerticalAlign::Super),
            ..Default::default()
        });
        let sub = doc.style(&ElementStyle {
            vertical_align: Some(VerticalAlign::Sub),
            ..Default::default()
        });
        doc.with_context_ref(|ctx| {
            let mut fragments = vec![
                fragment(base.clone(), text_kind(), 0.0),
                fragment(sup.clone(), text_kind(), 0.0),
                fragment(sub.clone(), text_kind(), 0.0),
            ];
            let m = align_line(ctx, &base, &mut fragments);
            assert!(fragments[1].y < fragments[0].y);
            assert!(fragments[2].y > fragments[0].y);
            assert!((fragments[0].y - fragments[1].y - 4.8).abs() < 0.01);
            assert!(m.height > 14.4);
        });
    }

    #[test]
    fn bottom_aligned_box_sits_on_the_line_bottom() {
        let doc = TestDocument::new(300.0, 400.0);
        let base = doc.style(&ElementStyle::default());
        let bottom = doc.style(&ElementStyle {
            vertical_align: Some(VerticalAlign::Bottom),
            ..Default::default()
        });
        doc.with_context_ref(|ctx| {
            let mut fragments = vec![fragment(base.clone(), text_kind(), 0.0), fragment(bottom, FragmentKind::Atomic, 30.0)];
            let m = align_line(ctx, &base, &mut fragments);
            assert!((m.height - 30.0).abs() < 0.01);
            assert!(fragments[1].y.abs() < 0.01);
            // The baseline moves down by the growth of the line.
            assert!((m.baseline - (10.8 + 15.6)).abs() < 0.01);
        });
    }
}
