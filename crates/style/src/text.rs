use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        matches!(self, Direction::Rtl)
    }
}

/// The CSS `white-space` property, already resolved by the cascade.
///
/// Whitespace collapsing itself happens before layout; these values only
/// control where the line breaker may (or must) break.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum WhiteSpace {
    #[default]
    Normal,
    Nowrap,
    Pre,
    PreWrap,
    PreLine,
}

impl WhiteSpace {
    /// Whether a literal newline forces a break.
    pub fn preserves_newlines(self) -> bool {
        matches!(self, WhiteSpace::Pre | WhiteSpace::PreWrap | WhiteSpace::PreLine)
    }

    /// Whether trailing spaces at the end of a line hang (are not measured).
    pub fn collapses_spaces(self) -> bool {
        matches!(self, WhiteSpace::Normal | WhiteSpace::Nowrap | WhiteSpace::PreLine)
    }
}

/// `word-wrap` / `overflow-wrap`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum WordWrap {
    #[default]
    Normal,
    BreakWord,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum WordBreak {
    #[default]
    Normal,
    BreakAll,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Sub,
    Super,
    Top,
    Middle,
    Bottom,
    TextTop,
    TextBottom,
    /// Raise (positive) or lower (negative) the baseline by a length.
    Length(f32),
    /// Raise by a percentage of the element's own line height.
    Percent(f32),
}

impl VerticalAlign {
    /// `top` and `bottom` are aligned against the finished line box rather
    /// than the parent baseline.
    pub fn is_line_relative(self) -> bool {
        matches!(self, VerticalAlign::Top | VerticalAlign::Bottom)
    }
}

impl Eq for VerticalAlign {}

impl Hash for VerticalAlign {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            VerticalAlign::Length(v) | VerticalAlign::Percent(v) => v.to_bits().hash(state),
            _ => {}
        }
    }
}
