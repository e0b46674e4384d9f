use crate::style::ComputedStyle;
use flowbox_style::text::Direction;
use flowbox_types::BoxId;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentKind {
    /// A span of a text box. `start..end` are byte offsets into the box's
    /// text after white-space processing; `text` is the span as shown,
    /// without the trailing hyphen a hyphenated span renders.
    Text {
        text: Arc<str>,
        start: usize,
        end: usize,
        hyphenated: bool,
    },
    /// Left edge (margin, border, padding) of an inline wrapper.
    Start,
    /// Right edge of an inline wrapper.
    End,
    /// An inline-block or replaced box; its own geometry is in the tree.
    Atomic,
    FootnoteCall {
        text: Arc<str>,
    },
    /// A list marker. `box_id` is the list item.
    Marker {
        text: Arc<str>,
        inside: bool,
    },
    LineBreak,
}

/// A positioned piece of inline content.
///
/// `x` is relative to the left of the block's content box, `y` to the top
/// of the line box. For text, `y`/`height` describe the em box.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub box_id: BoxId,
    pub kind: FragmentKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub direction: Direction,
    /// Extra advance per space added by justification.
    pub word_spacing: f32,
    pub style: Arc<ComputedStyle>,
}

impl InlineFragment {
    pub fn new(box_id: BoxId, kind: FragmentKind, width: f32, direction: Direction, style: Arc<ComputedStyle>) -> Self {
        Self {
            box_id,
            kind,
            x: 0.0,
            y: 0.0,
            width,
            height: 0.0,
            direction,
            word_spacing: 0.0,
            style,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, FragmentKind::Text { .. })
    }
}

/// One line of a block's inline content.
///
/// `x`/`y` are relative to the block's content box. `width` is the space
/// left between floats on this line; `content_width` what the fragments
/// use of it. Fragments are stored in visual order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub content_width: f32,
    pub height: f32,
    /// Distance from the top of the line to its baseline.
    pub baseline: f32,
    pub fragments: Vec<InlineFragment>,
    /// Footnote bodies called from this line.
    pub footnotes: Vec<BoxId>,
    /// The line ended at a `<br>` or a preserved newline.
    pub forced_break: bool,
}

impl LineBox {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// The concatenated text of the line's text fragments, in visual order.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .filter_map(|f| match &f.kind {
                FragmentKind::Text { text, hyphenated, .. } => {
                    Some(if *hyphenated { format!("{}-", text) } else { text.to_string() })
                }
                _ => None,
            })
            .collect()
    }
}
