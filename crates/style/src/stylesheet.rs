//! Style declarations handed to layout, and the page masters that shape each page.

use crate::dimension::{Dimension, Margins, PageSize};
use crate::display::{Clear, Display, Float, Position};
use crate::font::{FontStyle, FontWeight};
use crate::list::ListStylePosition;
use crate::paging::{PageBreak, PageBreakInside, PageSide, RepeatOnPage};
use crate::parsers::StyleParseError;
use crate::text::{Direction, TextAlign, VerticalAlign, WhiteSpace, WordBreak, WordWrap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The named regions around a page's content area.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum MarginBoxArea {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// The `:first`, `:left` and `:right` page selectors.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PagePseudo {
    First,
    Left,
    Right,
}

impl From<PageSide> for PagePseudo {
    fn from(side: PageSide) -> Self {
        match side {
            PageSide::Left => PagePseudo::Left,
            PageSide::Right => PagePseudo::Right,
        }
    }
}

/// A fully resolved page style.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
    /// Content of the margin boxes, rendered by the output consumer.
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub margin_boxes: BTreeMap<MarginBoxArea, String>,
}

impl PageLayout {
    /// Height of the content area after page margins.
    pub fn content_height(&self) -> f32 {
        let (_, height) = self.size.dimensions_pt();
        let margins = self.margins.unwrap_or_default();
        (height - margins.top - margins.bottom).max(0.0)
    }

    pub fn content_width(&self) -> f32 {
        let (width, _) = self.size.dimensions_pt();
        let margins = self.margins.unwrap_or_default();
        (width - margins.left - margins.right).max(0.0)
    }

    fn apply(&mut self, variant: &PageVariant) {
        if let Some(size) = variant.size {
            self.size = size;
        }
        if variant.margins.is_some() {
            self.margins = variant.margins;
        }
        for (area, content) in &variant.margin_boxes {
            self.margin_boxes.insert(*area, content.clone());
        }
    }
}

/// Overrides applied on top of a master for a pseudo-page.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageVariant {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<PageSize>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub margin_boxes: BTreeMap<MarginBoxArea, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMaster {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub margin_boxes: BTreeMap<MarginBoxArea, String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<PageVariant>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<PageVariant>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<PageVariant>,
}

impl PageMaster {
    fn variant(&self, pseudo: PagePseudo) -> Option<&PageVariant> {
        match pseudo {
            PagePseudo::First => self.first.as_ref(),
            PagePseudo::Left => self.left.as_ref(),
            PagePseudo::Right => self.right.as_ref(),
        }
    }
}

/// The set of named page masters for a document.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMasters {
    #[serde(default)]
    pub masters: HashMap<String, PageMaster>,
    /// The master used when content names no page (or an unknown one).
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_master: Option<String>,
}

impl PageMasters {
    pub fn from_json(json: &str) -> Result<Self, StyleParseError> {
        serde_json::from_str(json).map_err(|e| StyleParseError::Parse(e.to_string()))
    }

    /// A single unnamed master of the given size and margins.
    pub fn single(size: PageSize, margins: Margins) -> Self {
        let mut masters = HashMap::new();
        masters.insert(
            "default".to_string(),
            PageMaster {
                size,
                margins: Some(margins),
                ..Default::default()
            },
        );
        Self {
            masters,
            default_master: Some("default".to_string()),
        }
    }

    fn master(&self, name: Option<&str>) -> Option<&PageMaster> {
        name.and_then(|n| self.masters.get(n))
            .or_else(|| {
                self.default_master
                    .as_deref()
                    .and_then(|n| self.masters.get(n))
            })
            .or_else(|| self.masters.values().next())
    }

    /// Resolves the style of a page: the named (or default) master, then its
    /// side variant, then `:first` when `first` is set.
    pub fn resolve(&self, name: Option<&str>, side: PageSide, first: bool) -> PageLayout {
        let Some(master) = self.master(name) else {
            return PageLayout::default();
        };
        let mut layout = PageLayout {
            size: master.size,
            margins: master.margins,
            margin_boxes: master.margin_boxes.clone(),
        };
        if let Some(variant) = master.variant(side.into()) {
            layout.apply(variant);
        }
        if first {
            if let Some(variant) = master.variant(PagePseudo::First) {
                layout.apply(variant);
            }
        }
        layout
    }
}

/// Declared style of one element. Every property is optional; unset
/// properties inherit or fall back to their initial value when computed.
#[derive(Deserialize, Serialize, Default, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    // Font & Text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_indent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_space: Option<WhiteSpace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<WordWrap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_break: Option<WordBreak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,

    // Box generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float: Option<Float>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear: Option<Clear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Dimension>,

    // Box Model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margins>,
    /// `Auto` centres the box together with an auto `margin_right`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_right: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Margins>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<Margins>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<Dimension>,

    // Paged media
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_break_before: Option<PageBreak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_break_after: Option<PageBreak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_break_inside: Option<PageBreakInside>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_on_pages: Option<RepeatOnPage>,

    // List Properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_style_position: Option<ListStylePosition>,

    // Pseudo-elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line: Option<Box<ElementStyle>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_letter: Option<Box<ElementStyle>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_masters_from_json() {
        let json = r#"{
            "masters": {
                "report": {
                    "size": "Letter",
                    "margins": "1in",
                    "marginBoxes": { "bottom-center": "counter(page)" },
                    "first": { "margins": { "top": "2in" } },
                    "left": { "marginBoxes": { "bottom-left": "counter(page)" } }
                }
            },
            "defaultMaster": "report"
        }"#;
        let masters = PageMasters::from_json(json).unwrap();

        let first = masters.resolve(None, PageSide::Right, true);
        assert_eq!(first.size, PageSize::Letter);
        assert_eq!(first.margins.unwrap().top, 144.0);
        assert_eq!(first.content_height(), 792.0 - 144.0);

        let left = masters.resolve(Some("missing"), PageSide::Left, false);
        assert_eq!(left.margins, Some(Margins::all(72.0)));
        assert_eq!(left.margin_boxes.len(), 2);
    }

    #[test]
    fn test_resolve_without_masters() {
        let masters = PageMasters::default();
        let layout = masters.resolve(Some("any"), PageSide::Right, true);
        assert_eq!(layout, PageLayout::default());
        assert!((layout.content_height() - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_element_style_json() {
        let json = r#"{
            "display": "inline-block",
            "float": "left",
            "pageBreakInside": "avoid",
            "verticalAlign": { "length": 3.0 },
            "firstLine": { "fontSize": 18.0 }
        }"#;
        let style: ElementStyle = serde_json::from_str(json).unwrap();
        assert_eq!(style.display, Some(Display::InlineBlock));
        assert_eq!(style.float, Some(Float::Left));
        assert_eq!(style.page_break_inside, Some(PageBreakInside::Avoid));
        assert_eq!(style.vertical_align, Some(VerticalAlign::Length(3.0)));
        assert_eq!(style.first_line.unwrap().font_size, Some(18.0));
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let err = PageMasters::from_json("{ not json").unwrap_err();
        assert!(matches!(err, StyleParseError::Parse(_)));
    }
}
