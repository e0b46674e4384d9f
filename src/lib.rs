//! Paginating CSS box layout.
//!
//! The layout core lives in `flowbox-layout`; this crate re-exports its
//! public API and adds a JSON front end that builds box trees from
//! document descriptions.

pub mod document;
pub mod error;
pub mod pipeline;

pub use document::{DocumentSource, NodeSource, NodeType};
pub use error::FlowboxError;
pub use pipeline::{LayoutPipeline, LayoutResult};

pub use flowbox_layout::text::{FixedPitchMeasurer, UnicodeBidiSplitter, UnicodeBoundary};
pub use flowbox_layout::{
    BoxGeometry, BoxKind, BoxTree, ComputedStyle, FootnotePlacement, FragmentKind,
    InlineFragment, KeepTogetherPolicy, LaidOutDocument, LayoutBox, LayoutConfig, LayoutContext,
    LayoutEngine, LayoutError, LayoutServices, LayoutStats, LineBox, PageFrame, RepeatedBox,
    compute_style, get_default_style,
};
pub use flowbox_style::stylesheet::{ElementStyle, PageMasters};
pub use flowbox_traits::{BidiSplitter, FontMetrics, TextBoundary, TextMeasurer};
pub use flowbox_types::{BoxId, Edges, LineRef, Point, Rect, Size};

pub use flowbox_layout as layout;
pub use flowbox_style as style;
