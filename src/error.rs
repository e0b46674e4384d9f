use flowbox_layout::LayoutError;
use flowbox_style::StyleParseError;
use thiserror::Error;

/// Everything that can go wrong between a document description and its
/// laid-out pages.
#[derive(Error, Debug)]
pub enum FlowboxError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Style is invalid: {0}")]
    Style(#[from] StyleParseError),

    #[error("Document JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Named style '{0}' is not defined in the document.")]
    UnknownStyle(String),

    #[error("Document root must be a block node, found '{0}'.")]
    InvalidRoot(&'static str),
}
