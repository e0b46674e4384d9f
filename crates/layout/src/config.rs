#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Whether content is split into pages at all. With `false` the document
    /// is one continuous flow and page-break properties are ignored.
    pub paginate: bool,

    /// Lines of flow content kept above a footnote area before the area is
    /// allowed to spill onto the following pages.
    ///
    /// Defaults to `2`.
    pub min_footnote_lines: usize,

    /// How many times the same text offset may be pushed to a new line
    /// before the line breaker is told to emit something regardless of fit.
    ///
    /// Defaults to `5`.
    pub max_line_retries: usize,

    /// Pages scanned backwards from the end before page lookups fall back to
    /// binary search.
    ///
    /// Defaults to `5`.
    pub page_lookback: usize,

    /// Upper bound on layout attempts for one block child. Not a tuning knob:
    /// the relayout strategy never exceeds three, and stats assert against it.
    pub max_block_attempts: usize,

    /// The maximum number of text measurements kept before the measurement
    /// cache is cleared.
    ///
    /// Defaults to `10000`.
    pub cache_capacity: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paginate: true,
            min_footnote_lines: 2,
            max_line_retries: 5,
            page_lookback: 5,
            max_block_attempts: 3,
            cache_capacity: 10000,
        }
    }
}
