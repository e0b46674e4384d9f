use flowbox_traits::TextBoundary;
use unicode_linebreak::linebreaks;
use unicode_segmentation::UnicodeSegmentation;

/// Break opportunities from UAX #14 and grapheme boundaries from UAX #29.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeBoundary;

impl TextBoundary for UnicodeBoundary {
    fn next_word_break(&self, text: &str, from: usize) -> Option<usize> {
        if from >= text.len() {
            return None;
        }
        // linebreaks() always reports the end of the text.
        linebreaks(text).map(|(i, _)| i).find(|&i| i > from)
    }

    fn word_breaks(&self, text: &str) -> Vec<usize> {
        linebreaks(text).map(|(i, _)| i).filter(|&i| i > 0).collect()
    }

    fn next_char_break(&self, text: &str, from: usize) -> Option<usize> {
        let rest = text.get(from..)?;
        if rest.is_empty() {
            return None;
        }
        let next = rest
            .grapheme_indices(true)
            .nth(1)
            .map(|(i, _)| from + i)
            .unwrap_or(text.len());
        Some(next)
    }
}
