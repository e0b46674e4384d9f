//! TextMeasurer trait for abstracting font metrics.

use flowbox_style::FontSpec;
use std::fmt::Debug;

/// Vertical metrics of a font at a given size, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the em box (positive).
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the em box (positive).
    pub descent: f32,
    pub x_height: f32,
    pub underline_offset: f32,
    pub underline_thickness: f32,
}

impl FontMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Measures shaped text.
///
/// Implementations must be deterministic for a given `(font, text)` pair
/// within one layout run; layout caches widths and re-lays out subtrees
/// assuming the same answer comes back.
pub trait TextMeasurer: Send + Sync + Debug {
    /// Advance width of `text` set in `font`, without letter spacing.
    fn text_width(&self, font: &FontSpec, text: &str) -> f32;

    fn metrics(&self, font: &FontSpec) -> FontMetrics;
}
