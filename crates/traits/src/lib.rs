//! Services layout consumes but does not implement.
//!
//! Font loading and shaping, locale-aware text segmentation and the Unicode
//! bidirectional algorithm all live outside the layout core. `flowbox-layout`
//! ships default implementations of each for tests and simple documents.

pub mod bidi;
pub mod boundary;
pub mod measure;

pub use bidi::{BidiRun, BidiSplitter};
pub use boundary::TextBoundary;
pub use measure::{FontMetrics, TextMeasurer};
