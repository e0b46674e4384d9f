//! Paged-media properties.
use serde::{Deserialize, Serialize};

/// `page-break-before` / `page-break-after`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum PageBreak {
    #[default]
    Auto,
    Always,
    Avoid,
    /// Break so that the next content starts on a left page.
    Left,
    /// Break so that the next content starts on a right page.
    Right,
}

impl PageBreak {
    pub fn is_forced(self) -> bool {
        matches!(self, PageBreak::Always | PageBreak::Left | PageBreak::Right)
    }

    /// The page side the content after the break must start on, if any.
    pub fn required_side(self) -> Option<PageSide> {
        match self {
            PageBreak::Left => Some(PageSide::Left),
            PageBreak::Right => Some(PageSide::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum PageBreakInside {
    #[default]
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PageSide {
    Left,
    Right,
}

/// Marks a block whose height is reserved on every following page of its
/// parent, in the way repeated table headers and footers are.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum RepeatOnPage {
    #[default]
    None,
    Header,
    Footer,
}
