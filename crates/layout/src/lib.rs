use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Box {0} does not exist in the box tree.")]
    UnknownBox(BoxId),
    #[error("Box {0} mixes block-level and inline-level children.")]
    MixedChildren(BoxId),
    #[error("Text box {0} has no text.")]
    MissingText(BoxId),
    #[error("Box {0} cannot be a layout root: it must be a parentless block.")]
    InvalidRoot(BoxId),
    #[error("Box {0} already has a parent.")]
    AlreadyAttached(BoxId),
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod cache;
pub mod config;
pub mod engine;
pub mod interface;
pub mod nodes;
pub mod output;
pub mod perf;
pub mod state;
pub mod style;
pub mod tree;
pub mod util;

pub mod algorithms;
pub mod text;

pub use self::config::LayoutConfig;
pub use self::engine::LayoutEngine;
pub use self::interface::{KeepTogetherPolicy, LayoutContext, LayoutServices};
pub use self::nodes::inline::{FragmentKind, InlineFragment, LineBox};
pub use self::output::{FootnotePlacement, LaidOutDocument, PageFrame, RepeatedBox};
pub use self::perf::LayoutStats;
pub use self::state::LayoutState;
pub use self::style::{ComputedStyle, compute_style, get_default_style};
pub use self::tree::{BoxGeometry, BoxKind, BoxTree, LayoutBox};

// Re-export geometry types used by nodes from base to prevent type mismatches
pub use flowbox_types::{BoxId, Edges, LineRef, Point, Rect, Size};

#[cfg(test)]
mod inline_test;
#[cfg(test)]
mod test_utils;
