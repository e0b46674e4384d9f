//! The box tree layout operates on.
//!
//! Boxes live in a flat arena and refer to each other by `BoxId`. The caller
//! builds the tree (one box per generated CSS box, already normalised so that
//! a block holds either block-level or inline-level children), layout fills
//! in the geometry, and the output consumer reads it back.

use crate::LayoutError;
use crate::nodes::inline::LineBox;
use crate::style::ComputedStyle;
use flowbox_style::display::Display;
use flowbox_types::{BoxId, Edges, Point, Rect, Size};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    /// A block container. Whether it is block-level or an atomic inline
    /// (inline-block) is decided by its `display`.
    Block,
    /// An inline wrapper such as `<span>`.
    Inline,
    /// A run of already whitespace-processed text.
    Text(Arc<str>),
    /// An atomic box with an intrinsic size (images, embedded objects).
    Replaced(Size),
    /// A forced line break (`<br>`).
    LineBreak,
}

/// Geometry of one box.
///
/// `x`/`y` locate the border box relative to the content box of the
/// containing block; `abs_x`/`abs_y` are document coordinates. Content
/// width and height are those of the content box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxGeometry {
    pub x: f32,
    pub y: f32,
    pub abs_x: f32,
    pub abs_y: f32,
    pub content_width: f32,
    pub content_height: f32,
    pub margin: Edges,
    pub border: Edges,
    pub padding: Edges,
    /// Visual offset from `position: relative`. Never affects flow.
    pub rel_offset: Point,
}

impl BoxGeometry {
    pub fn border_box_width(&self) -> f32 {
        self.content_width + self.border.horizontal() + self.padding.horizontal()
    }

    pub fn border_box_height(&self) -> f32 {
        self.content_height + self.border.vertical() + self.padding.vertical()
    }

    pub fn margin_box_width(&self) -> f32 {
        self.border_box_width() + self.margin.horizontal()
    }

    pub fn margin_box_height(&self) -> f32 {
        self.border_box_height() + self.margin.vertical()
    }

    /// Absolute position of the content box's top-left corner.
    pub fn content_origin(&self) -> Point {
        Point::new(
            self.abs_x + self.border.left + self.padding.left,
            self.abs_y + self.border.top + self.padding.top,
        )
    }

    pub fn border_rect(&self) -> Rect {
        Rect::new(
            self.abs_x,
            self.abs_y,
            self.border_box_width(),
            self.border_box_height(),
        )
    }

    pub fn abs_bottom(&self) -> f32 {
        self.abs_y + self.border_box_height()
    }
}

#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub kind: BoxKind,
    pub style: Arc<ComputedStyle>,
    pub parent: Option<BoxId>,
    pub children: Vec<BoxId>,
    pub geometry: BoxGeometry,
    /// Line boxes, for blocks whose children are inline-level.
    pub lines: Vec<LineBox>,
    /// List marker text, for list items.
    pub marker: Option<Arc<str>>,
    /// Set when the first line of this block had to move to the next page
    /// while the block's top decoration stayed behind.
    pub needs_page_clear: bool,
}

impl LayoutBox {
    pub fn new(kind: BoxKind, style: Arc<ComputedStyle>) -> Self {
        Self {
            kind,
            style,
            parent: None,
            children: Vec::new(),
            geometry: BoxGeometry::default(),
            lines: Vec::new(),
            marker: None,
            needs_page_clear: false,
        }
    }

    pub fn is_displayed(&self) -> bool {
        self.style.flow.display != Display::None
    }

    /// True for boxes that take part in block flow: block containers that
    /// are neither atomic inlines nor taken out of flow.
    pub fn is_block_level(&self) -> bool {
        matches!(self.kind, BoxKind::Block)
            && !self.style.flow.display.is_atomic_inline()
            && !self.is_out_of_flow()
    }

    /// Floats, footnote bodies and absolutely/fixed positioned boxes.
    pub fn is_out_of_flow(&self) -> bool {
        self.style.is_floated() || self.style.is_footnote() || self.style.is_out_of_flow_positioned()
    }

    /// Whether this box lays out its contents in a new block formatting context.
    pub fn establishes_bfc(&self) -> bool {
        matches!(self.kind, BoxKind::Block)
            && (self.parent.is_none()
                || self.style.is_floated()
                || self.style.is_footnote()
                || self.style.is_out_of_flow_positioned()
                || self.style.flow.display.is_atomic_inline()
                || self.style.flow.display == Display::FlowRoot)
    }

    fn reset_layout(&mut self) {
        self.geometry = BoxGeometry::default();
        self.lines.clear();
        self.needs_page_clear = false;
    }
}

#[derive(Debug, Default, Clone)]
pub struct BoxTree {
    boxes: Vec<LayoutBox>,
}

impl BoxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn add(&mut self, kind: BoxKind, style: Arc<ComputedStyle>) -> BoxId {
        let id = BoxId::new(self.boxes.len());
        self.boxes.push(LayoutBox::new(kind, style));
        id
    }

    pub fn add_block(&mut self, style: Arc<ComputedStyle>) -> BoxId {
        self.add(BoxKind::Block, style)
    }

    pub fn add_inline(&mut self, style: Arc<ComputedStyle>) -> BoxId {
        self.add(BoxKind::Inline, style)
    }

    pub fn add_text(&mut self, style: Arc<ComputedStyle>, text: &str) -> BoxId {
        self.add(BoxKind::Text(Arc::from(text)), style)
    }

    pub fn add_replaced(&mut self, style: Arc<ComputedStyle>, size: Size) -> BoxId {
        self.add(BoxKind::Replaced(size), style)
    }

    pub fn add_line_break(&mut self, style: Arc<ComputedStyle>) -> BoxId {
        self.add(BoxKind::LineBreak, style)
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) -> Result<(), LayoutError> {
        self.get(parent)?;
        if self.get(child)?.parent.is_some() || parent == child {
            return Err(LayoutError::AlreadyAttached(child));
        }
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    pub fn set_marker(&mut self, id: BoxId, marker: &str) -> Result<(), LayoutError> {
        self.get_mut(id)?.marker = Some(Arc::from(marker));
        Ok(())
    }

    pub fn get(&self, id: BoxId) -> Result<&LayoutBox, LayoutError> {
        self.boxes.get(id.index()).ok_or(LayoutError::UnknownBox(id))
    }

    pub fn get_mut(&mut self, id: BoxId) -> Result<&mut LayoutBox, LayoutError> {
        self.boxes
            .get_mut(id.index())
            .ok_or(LayoutError::UnknownBox(id))
    }

    pub fn style(&self, id: BoxId) -> Result<Arc<ComputedStyle>, LayoutError> {
        Ok(self.get(id)?.style.clone())
    }

    pub fn children(&self, id: BoxId) -> Result<Vec<BoxId>, LayoutError> {
        Ok(self.get(id)?.children.clone())
    }

    pub fn geometry(&self, id: BoxId) -> Result<BoxGeometry, LayoutError> {
        Ok(self.get(id)?.geometry)
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn is_within(&self, node: BoxId, ancestor: BoxId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.boxes.get(id.index()).and_then(|b| b.parent);
        }
        false
    }

    /// The box and all its descendants in depth-first pre-order.
    pub fn subtree(&self, root: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(b) = self.boxes.get(id.index()) else {
                continue;
            };
            out.push(id);
            stack.extend(b.children.iter().rev().copied());
        }
        out
    }

    /// Clears all geometry and line boxes under `root`, ready for another
    /// layout attempt.
    pub fn reset_subtree(&mut self, root: BoxId) {
        for id in self.subtree(root) {
            if let Some(b) = self.boxes.get_mut(id.index()) {
                b.reset_layout();
            }
        }
    }

    /// Moves an already laid out subtree. Relative positions are kept; only
    /// document coordinates change.
    pub fn translate_subtree(&mut self, root: BoxId, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for id in self.subtree(root) {
            if let Some(b) = self.boxes.get_mut(id.index()) {
                b.geometry.abs_x += dx;
                b.geometry.abs_y += dy;
            }
        }
    }

    /// Border box in document coordinates with the relative offsets of the
    /// box and all its ancestors applied.
    pub fn visual_rect(&self, id: BoxId) -> Result<Rect, LayoutError> {
        let rect = self.get(id)?.geometry.border_rect();
        let mut dx = 0.0;
        let mut dy = 0.0;
        let mut current = Some(id);
        while let Some(cid) = current {
            let b = self.get(cid)?;
            dx += b.geometry.rel_offset.x;
            dy += b.geometry.rel_offset.y;
            current = b.parent;
        }
        Ok(rect.translate(dx, dy))
    }

    /// Checks the structural rules layout relies on for the subtree at `root`.
    pub fn validate(&self, root: BoxId) -> Result<(), LayoutError> {
        let root_box = self.get(root)?;
        if root_box.kind != BoxKind::Block || root_box.parent.is_some() {
            return Err(LayoutError::InvalidRoot(root));
        }
        for id in self.subtree(root) {
            let b = self.get(id)?;
            match &b.kind {
                BoxKind::Text(text) if text.is_empty() => {
                    return Err(LayoutError::MissingText(id));
                }
                BoxKind::Text(_) | BoxKind::Replaced(_) | BoxKind::LineBreak => {
                    if !b.children.is_empty() {
                        return Err(LayoutError::MixedChildren(id));
                    }
                }
                BoxKind::Inline => {
                    for child in &b.children {
                        let c = self.get(*child)?;
                        if c.is_displayed() && c.is_block_level() {
                            return Err(LayoutError::MixedChildren(id));
                        }
                    }
                }
                BoxKind::Block => {
                    let mut has_block = false;
                    let mut has_inline = false;
                    for child in &b.children {
                        let c = self.get(*child)?;
                        if !c.is_displayed() || c.is_out_of_flow() {
                            continue;
                        }
                        if c.is_block_level() {
                            has_block = true;
                        } else {
                            has_inline = true;
                        }
                    }
                    if has_block && has_inline {
                        return Err(LayoutError::MixedChildren(id));
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the in-flow children of a block are inline-level.
    /// Out-of-flow children alone count as inline content.
    pub fn has_inline_children(&self, id: BoxId) -> Result<bool, LayoutError> {
        let b = self.get(id)?;
        let mut any = false;
        for child in &b.children {
            let c = self.get(*child)?;
            if !c.is_displayed() {
                continue;
            }
            if c.is_block_level() {
                return Ok(false);
            }
            any = true;
        }
        Ok(any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::get_default_style;

    #[test]
    fn append_child_rejects_second_parent() {
        let mut tree = BoxTree::new();
        let a = tree.add_block(get_default_style());
        let b = tree.add_block(get_default_style());
        let c = tree.add_block(get_default_style());
        tree.append_child(a, c).unwrap();
        assert!(matches!(
            tree.append_child(b, c),
            Err(LayoutError::AlreadyAttached(_))
        ));
    }

    #[test]
    fn subtree_is_preorder() {
        let mut tree = BoxTree::new();
        let root = tree.add_block(get_default_style());
        let a = tree.add_block(get_default_style());
        let a1 = tree.add_block(get_default_style());
        let b = tree.add_block(get_default_style());
        tree.append_child(root, a).unwrap();
        tree.append_child(a, a1).unwrap();
        tree.append_child(root, b).unwrap();
        assert_eq!(tree.subtree(root), vec![root, a, a1, b]);
        assert!(tree.is_within(a1, root));
        assert!(!tree.is_within(b, a));
    }

    #[test]
    fn translate_moves_descendants() {
        let mut tree = BoxTree::new();
        let root = tree.add_block(get_default_style());
        let child = tree.add_block(get_default_style());
        tree.append_child(root, child).unwrap();
        tree.get_mut(child).unwrap().geometry.abs_y = 10.0;
        tree.translate_subtree(root, 5.0, 20.0);
        let g = tree.geometry(child).unwrap();
        assert_eq!((g.abs_x, g.abs_y), (5.0, 30.0));
    }
}
