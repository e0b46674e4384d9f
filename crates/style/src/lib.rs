pub mod dimension;
pub mod display;
pub mod font;
pub mod list;
pub mod paging;
pub mod parsers;
pub mod stylesheet;
pub mod text;

pub use dimension::{Dimension, Margins, PageSize};
pub use display::{Clear, Display, Float, Position};
pub use font::{FontSpec, FontStyle, FontWeight};
pub use list::ListStylePosition;
pub use paging::{PageBreak, PageBreakInside, PageSide, RepeatOnPage};
pub use parsers::StyleParseError;
pub use stylesheet::{ElementStyle, MarginBoxArea, PageLayout, PageMasters, PagePseudo};
pub use text::{Direction, TextAlign, VerticalAlign, WhiteSpace, WordBreak, WordWrap};
