pub mod block;
pub mod inline;
pub mod intrinsic;
pub mod positioned;

pub use block::{BlockInput, layout_block_box, layout_block_children};
pub use inline::layout_inline_content;
