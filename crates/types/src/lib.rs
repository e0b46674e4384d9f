pub mod geometry;
pub mod ids;

pub use geometry::{Edges, Point, Rect, Size};
pub use ids::{BoxId, LineRef};
