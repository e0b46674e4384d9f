//! Box generation and positioning schemes (`display`, `float`, `clear`, `position`).
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum Display {
    Block,
    #[default]
    Inline,
    InlineBlock,
    ListItem,
    /// A block container that always establishes a formatting context.
    FlowRoot,
    /// Laid out as a block; column widths are resolved elsewhere.
    Table,
    /// Laid out as an inline-block.
    InlineTable,
    None,
}

impl Display {
    pub fn is_block_level(self) -> bool {
        matches!(
            self,
            Display::Block | Display::ListItem | Display::FlowRoot | Display::Table
        )
    }

    /// Atomic inline-level boxes: laid out as a block, placed on a line.
    pub fn is_atomic_inline(self) -> bool {
        matches!(self, Display::InlineBlock | Display::InlineTable)
    }
}

/// `float`. `Footnote` moves the element into the page's footnote area and
/// leaves a call behind in the line that referenced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
    Footnote,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum Clear {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl Clear {
    pub fn clears_left(self) -> bool {
        matches!(self, Clear::Left | Clear::Both)
    }

    pub fn clears_right(self) -> bool {
        matches!(self, Clear::Right | Clear::Both)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

impl Position {
    pub fn is_out_of_flow(self) -> bool {
        matches!(self, Position::Absolute | Position::Fixed)
    }
}
