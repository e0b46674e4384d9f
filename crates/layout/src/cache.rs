use crate::perf::LayoutStats;
use flowbox_style::FontSpec;
use flowbox_traits::TextMeasurer;
use std::collections::HashMap;

const SOFT_HYPHEN: char = '\u{AD}';

#[derive(Hash, PartialEq, Eq, Clone)]
pub struct MeasureCacheKey {
    pub font: FontSpec,
    pub text: String,
}

/// Memoizes text widths per (font, text) for one layout run.
///
/// Line breaking measures growing prefixes of the same text over and over,
/// and every relayout attempt repeats those measurements.
pub struct MeasureCache {
    widths: HashMap<MeasureCacheKey, f32>,
    capacity: usize,
}

impl MeasureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            widths: HashMap::new(),
            capacity,
        }
    }

    /// Advance width of `text` plus `letter_spacing` per character.
    /// Soft hyphens are invisible and have no advance.
    pub fn width(
        &mut self,
        measurer: &dyn TextMeasurer,
        font: &FontSpec,
        letter_spacing: f32,
        text: &str,
        stats: &mut LayoutStats,
    ) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let visible: String = text.chars().filter(|c| *c != SOFT_HYPHEN).collect();
        let spacing = letter_spacing * visible.chars().count() as f32;

        let key = MeasureCacheKey {
            font: font.clone(),
            text: visible,
        };
        if let Some(w) = self.widths.get(&key) {
            stats.measure_hits += 1;
            return *w + spacing;
        }
        stats.measure_misses += 1;
        let w = measurer.text_width(font, &key.text);
        if self.widths.len() >= self.capacity {
            log::debug!("Measure cache reached {} entries; clearing", self.capacity);
            self.widths.clear();
        }
        self.widths.insert(key, w);
        w + spacing
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn clear(&mut self) {
        self.widths.clear();
    }
}
