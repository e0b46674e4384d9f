use flowbox_style::dimension::{Dimension, Margins};
use flowbox_style::display::{Clear, Display, Float, Position};
use flowbox_style::font::{FontSpec, FontStyle, FontWeight};
use flowbox_style::list::ListStylePosition;
use flowbox_style::paging::{PageBreak, PageBreakInside, RepeatOnPage};
use flowbox_style::stylesheet::ElementStyle;
use flowbox_style::text::{Direction, TextAlign, VerticalAlign, WhiteSpace, WordBreak, WordWrap};
use flowbox_types::Edges;
use std::sync::Arc;

// Grouped Style Structures

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxModel {
    pub margin: Margins,
    pub margin_left_auto: bool,
    pub margin_right_auto: bool,
    pub padding: Margins,
    pub border: Margins,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub min_height: Dimension,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextModel {
    pub font_family: Arc<str>,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub line_height: f32,
    pub text_align: TextAlign,
    pub text_indent: f32,
    pub letter_spacing: f32,
    pub direction: Direction,
    pub white_space: WhiteSpace,
    pub word_wrap: WordWrap,
    pub word_break: WordBreak,
}

impl Default for TextModel {
    fn default() -> Self {
        Self {
            font_family: Arc::from("Helvetica"),
            font_size: 12.0,
            font_weight: FontWeight::Regular,
            font_style: FontStyle::Normal,
            line_height: 14.4,
            text_align: TextAlign::Start,
            text_indent: 0.0,
            letter_spacing: 0.0,
            direction: Direction::Ltr,
            white_space: WhiteSpace::Normal,
            word_wrap: WordWrap::Normal,
            word_break: WordBreak::Normal,
        }
    }
}

/// Box generation and positioning scheme.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowModel {
    pub display: Display,
    pub float: Float,
    pub clear: Clear,
    pub position: Position,
    pub top: Dimension,
    pub right: Dimension,
    pub bottom: Dimension,
    pub left: Dimension,
    pub vertical_align: VerticalAlign,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PagingModel {
    pub break_before: PageBreak,
    pub break_after: PageBreak,
    pub break_inside: PageBreakInside,
    pub page: Option<Arc<str>>,
    pub repeat: RepeatOnPage,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListModel {
    pub style_position: ListStylePosition,
}

/// `::first-line` and `::first-letter` declarations, applied on top of the
/// style of whatever text ends up on the first line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PseudoModel {
    pub first_line: Option<Arc<ElementStyle>>,
    pub first_letter: Option<Arc<ElementStyle>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyleData {
    pub box_model: BoxModel,
    pub text: TextModel,
    pub flow: FlowModel,
    pub paging: PagingModel,
    pub list: ListModel,
    pub pseudo: PseudoModel,
}

impl ComputedStyleData {
    /// Returns the total width of horizontal padding.
    pub fn padding_x(&self) -> f32 {
        self.box_model.padding.left + self.box_model.padding.right
    }

    /// Returns the total height of vertical padding.
    pub fn padding_y(&self) -> f32 {
        self.box_model.padding.top + self.box_model.padding.bottom
    }

    /// Returns the total width of horizontal borders.
    pub fn border_x(&self) -> f32 {
        self.box_model.border.left + self.box_model.border.right
    }

    /// Returns the total height of vertical borders.
    pub fn border_y(&self) -> f32 {
        self.box_model.border.top + self.box_model.border.bottom
    }

    pub fn margin_edges(&self) -> Edges {
        self.box_model.margin.to_edges()
    }

    pub fn border_edges(&self) -> Edges {
        self.box_model.border.to_edges()
    }

    pub fn padding_edges(&self) -> Edges {
        self.box_model.padding.to_edges()
    }

    /// Border plus padding above the content box.
    pub fn top_decoration(&self) -> f32 {
        self.box_model.border.top + self.box_model.padding.top
    }

    pub fn is_floated(&self) -> bool {
        matches!(self.flow.float, Float::Left | Float::Right)
    }

    pub fn is_footnote(&self) -> bool {
        matches!(self.flow.float, Float::Footnote)
    }

    pub fn is_out_of_flow_positioned(&self) -> bool {
        self.flow.position.is_out_of_flow()
    }

    /// `text-align` with `start`/`end` resolved against the direction.
    pub fn resolved_text_align(&self) -> TextAlign {
        match (self.text.text_align, self.text.direction) {
            (TextAlign::Start, Direction::Ltr) | (TextAlign::End, Direction::Rtl) => {
                TextAlign::Left
            }
            (TextAlign::Start, Direction::Rtl) | (TextAlign::End, Direction::Ltr) => {
                TextAlign::Right
            }
            (align, _) => align,
        }
    }
}

/// A computed style together with the font selection derived from it.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    /// The actual style data.
    pub inner: ComputedStyleData,
    font: FontSpec,
}

impl ComputedStyle {
    pub fn new(data: ComputedStyleData) -> Self {
        let font = FontSpec {
            family: data.text.font_family.clone(),
            size: data.text.font_size,
            weight: data.text.font_weight,
            style: data.text.font_style,
        };
        Self { inner: data, font }
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }
}

impl Default for ComputedStyle {
    fn default() -> Self {
        let mut data = ComputedStyleData::default();
        data.flow.display = Display::Block;
        Self::new(data)
    }
}

// Allows accessing style data directly (e.g. style.box_model)
impl std::ops::Deref for ComputedStyle {
    type Target = ComputedStyleData;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl PartialEq for ComputedStyle {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

/// Computes the style for a box by inheriting from its parent, applying the
/// given declaration sets in order, and finally the override.
pub fn compute_style(
    style_sets: &[Arc<ElementStyle>],
    style_override: Option<&ElementStyle>,
    parent_style: &Arc<ComputedStyle>,
) -> Arc<ComputedStyle> {
    let mut merged = ElementStyle::default();
    for style_def in style_sets {
        merge_element_styles(&mut merged, style_def);
    }
    if let Some(override_style_def) = style_override {
        merge_element_styles(&mut merged, override_style_def);
    }

    let parent_text = &parent_style.text;
    let text = TextModel {
        font_family: merged
            .font_family
            .as_deref()
            .map(Arc::from)
            .unwrap_or_else(|| parent_text.font_family.clone()),
        font_size: merged.font_size.unwrap_or(parent_text.font_size),
        font_weight: merged.font_weight.unwrap_or(parent_text.font_weight),
        font_style: merged.font_style.unwrap_or(parent_text.font_style),
        line_height: merged.line_height.unwrap_or_else(|| {
            merged
                .font_size
                .map(|fs| fs * 1.2)
                .unwrap_or(parent_text.line_height)
        }),
        text_align: merged.text_align.unwrap_or(parent_text.text_align),
        text_indent: merged.text_indent.unwrap_or(parent_text.text_indent),
        letter_spacing: merged.letter_spacing.unwrap_or(parent_text.letter_spacing),
        direction: merged.direction.unwrap_or(parent_text.direction),
        white_space: merged.white_space.unwrap_or(parent_text.white_space),
        word_wrap: merged.word_wrap.unwrap_or(parent_text.word_wrap),
        word_break: merged.word_break.unwrap_or(parent_text.word_break),
    };

    let margin = merged.margin.unwrap_or_default();
    let (margin_left, margin_left_auto) = resolve_margin_side(merged.margin_left, margin.left);
    let (margin_right, margin_right_auto) =
        resolve_margin_side(merged.margin_right, margin.right);

    let computed_data = ComputedStyleData {
        text,
        list: ListModel {
            style_position: merged
                .list_style_position
                .unwrap_or(parent_style.list.style_position),
        },
        // Non-inherited properties
        box_model: BoxModel {
            margin: Margins {
                left: margin_left,
                right: margin_right,
                ..margin
            },
            margin_left_auto,
            margin_right_auto,
            padding: merged.padding.unwrap_or_default(),
            border: merged.border_width.unwrap_or_default(),
            width: merged.width,
            height: merged.height,
            min_height: merged.min_height.unwrap_or(Dimension::Auto),
        },
        flow: FlowModel {
            display: merged.display.unwrap_or_default(),
            float: merged.float.unwrap_or_default(),
            clear: merged.clear.unwrap_or_default(),
            position: merged.position.unwrap_or_default(),
            top: merged.top.unwrap_or_default(),
            right: merged.right.unwrap_or_default(),
            bottom: merged.bottom.unwrap_or_default(),
            left: merged.left.unwrap_or_default(),
            vertical_align: merged.vertical_align.unwrap_or_default(),
        },
        paging: PagingModel {
            break_before: merged.page_break_before.unwrap_or_default(),
            break_after: merged.page_break_after.unwrap_or_default(),
            break_inside: merged.page_break_inside.unwrap_or_default(),
            page: merged.page.as_deref().map(Arc::from),
            repeat: merged.repeat_on_pages.unwrap_or_default(),
        },
        pseudo: PseudoModel {
            first_line: merged.first_line.map(|s| Arc::new(*s)),
            first_letter: merged.first_letter.map(|s| Arc::new(*s)),
        },
    };

    Arc::new(ComputedStyle::new(computed_data))
}

/// Applies pseudo-element declarations on top of an element's own style.
/// Only inherited text properties are taken from `pseudo`; box and flow
/// properties stay those of `base`.
pub fn apply_pseudo_style(base: &Arc<ComputedStyle>, pseudo: &ElementStyle) -> Arc<ComputedStyle> {
    let derived = compute_style(&[], Some(pseudo), base);
    let mut data = base.inner.clone();
    data.text = derived.text.clone();
    Arc::new(ComputedStyle::new(data))
}

/// Returns the default style for the document root.
pub fn get_default_style() -> Arc<ComputedStyle> {
    Arc::new(ComputedStyle::default())
}

fn resolve_margin_side(side: Option<Dimension>, shorthand: f32) -> (f32, bool) {
    match side {
        Some(Dimension::Auto) => (0.0, true),
        Some(Dimension::Pt(v)) => (v, false),
        // Percentages need the containing block width; they are not
        // supported on the longhands.
        Some(Dimension::Percent(_)) | None => (shorthand, false),
    }
}

/// Merges properties from `to_apply` into `base`.
fn merge_element_styles(base: &mut ElementStyle, to_apply: &ElementStyle) {
    if to_apply.font_family.is_some() { base.font_family = to_apply.font_family.clone(); }
    if to_apply.font_size.is_some() { base.font_size = to_apply.font_size; }
    if to_apply.font_weight.is_some() { base.font_weight = to_apply.font_weight; }
    if to_apply.font_style.is_some() { base.font_style = to_apply.font_style; }
    if to_apply.line_height.is_some() { base.line_height = to_apply.line_height; }
    if to_apply.text_align.is_some() { base.text_align = to_apply.text_align; }
    if to_apply.text_indent.is_some() { base.text_indent = to_apply.text_indent; }
    if to_apply.letter_spacing.is_some() { base.letter_spacing = to_apply.letter_spacing; }
    if to_apply.direction.is_some() { base.direction = to_apply.direction; }
    if to_apply.white_space.is_some() { base.white_space = to_apply.white_space; }
    if to_apply.word_wrap.is_some() { base.word_wrap = to_apply.word_wrap; }
    if to_apply.word_break.is_some() { base.word_break = to_apply.word_break; }
    if to_apply.vertical_align.is_some() { base.vertical_align = to_apply.vertical_align; }
    if to_apply.display.is_some() { base.display = to_apply.display; }
    if to_apply.float.is_some() { base.float = to_apply.float; }
    if to_apply.clear.is_some() { base.clear = to_apply.clear; }
    if to_apply.position.is_some() { base.position = to_apply.position; }
    if to_apply.top.is_some() { base.top = to_apply.top; }
    if to_apply.right.is_some() { base.right = to_apply.right; }
    if to_apply.bottom.is_some() { base.bottom = to_apply.bottom; }
    if to_apply.left.is_some() { base.left = to_apply.left; }
    if to_apply.margin.is_some() { base.margin = to_apply.margin; }
    if to_apply.margin_left.is_some() { base.margin_left = to_apply.margin_left; }
    if to_apply.margin_right.is_some() { base.margin_right = to_apply.margin_right; }
    if to_apply.padding.is_some() { base.padding = to_apply.padding; }
    if to_apply.border_width.is_some() { base.border_width = to_apply.border_width; }
    if to_apply.width.is_some() { base.width = to_apply.width; }
    if to_apply.height.is_some() { base.height = to_apply.height; }
    if to_apply.min_height.is_some() { base.min_height = to_apply.min_height; }
    if to_apply.page_break_before.is_some() { base.page_break_before = to_apply.page_break_before; }
    if to_apply.page_break_after.is_some() { base.page_break_after = to_apply.page_break_after; }
    if to_apply.page_break_inside.is_some() { base.page_break_inside = to_apply.page_break_inside; }
    if to_apply.page.is_some() { base.page = to_apply.page.clone(); }
    if to_apply.repeat_on_pages.is_some() { base.repeat_on_pages = to_apply.repeat_on_pages; }
    if to_apply.list_style_position.is_some() { base.list_style_position = to_apply.list_style_position; }
    if to_apply.first_line.is_some() { base.first_line = to_apply.first_line.clone(); }
    if to_apply.first_letter.is_some() { base.first_letter = to_apply.first_letter.clone(); }
}
