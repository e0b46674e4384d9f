use flowbox_style::FontSpec;
use flowbox_traits::{FontMetrics, TextMeasurer};

/// A deterministic measurer giving every character the same advance.
///
/// Used when no real font service is plugged in, and throughout the tests:
/// with `advance` set to `0.5`, a 12pt character is exactly 6pt wide.
#[derive(Debug, Clone, Copy)]
pub struct FixedPitchMeasurer {
    /// Advance of one character as a fraction of the font size.
    pub advance: f32,
}

impl FixedPitchMeasurer {
    pub fn new(advance: f32) -> Self {
        Self { advance }
    }
}

impl Default for FixedPitchMeasurer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl TextMeasurer for FixedPitchMeasurer {
    fn text_width(&self, font: &FontSpec, text: &str) -> f32 {
        text.chars().count() as f32 * font.size * self.advance
    }

    fn metrics(&self, font: &FontSpec) -> FontMetrics {
        FontMetrics {
            ascent: font.size * 0.8,
            descent: font.size * 0.2,
            x_height: font.size * 0.5,
            underline_offset: font.size * 0.1,
            underline_thickness: font.size * 0.05,
        }
    }
}
