//! Defines enums for CSS list properties.
use serde::{Deserialize, Serialize};

/// Where the list marker of a list item is placed relative to its first line.
///
/// `Inside` markers take up room at the start of the first line; `Outside`
/// markers hang in the margin and do not reduce the available width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum ListStylePosition {
    Inside,
    #[default]
    Outside,
}
