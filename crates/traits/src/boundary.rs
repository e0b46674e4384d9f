use std::fmt::Debug;

/// Forward iteration over break opportunities in a string.
///
/// Offsets are byte offsets on `char` boundaries. Both methods return the
/// first opportunity strictly after `from`, or `None` at the end of the text.
/// The end of the text is itself reported as an opportunity.
pub trait TextBoundary: Send + Sync + Debug {
    /// Next line-break opportunity (word mode).
    fn next_word_break(&self, text: &str, from: usize) -> Option<usize>;

    /// Next grapheme boundary (character mode).
    fn next_char_break(&self, text: &str, from: usize) -> Option<usize>;

    /// Every line-break opportunity in `text`, ascending.
    ///
    /// Line breaking asks for this once per text run and searches it, so
    /// implementations with a costly `next_word_break` should override it.
    fn word_breaks(&self, text: &str) -> Vec<usize> {
        let mut breaks = Vec::new();
        let mut pos = 0;
        while let Some(next) = self.next_word_break(text, pos) {
            if next <= pos {
                break;
            }
            breaks.push(next);
            pos = next;
        }
        breaks
    }
}
