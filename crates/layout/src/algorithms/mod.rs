pub mod floats;
pub mod footnotes;
pub mod pagination;
