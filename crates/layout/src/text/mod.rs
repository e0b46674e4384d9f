pub mod bidi;
pub mod boundary;
pub mod line_breaker;
pub mod measure;

pub use bidi::UnicodeBidiSplitter;
pub use boundary::UnicodeBoundary;
pub use line_breaker::{BreakOptions, LineBreakContext, RetryGuard, break_text};
pub use measure::FixedPitchMeasurer;
