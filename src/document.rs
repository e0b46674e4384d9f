//! Box trees described as JSON.
//!
//! A document names reusable styles once, optionally carries its page
//! masters, and nests nodes under a single block root:
//!
//! ```json
//! {
//!   "styles": { "body": { "fontSize": 10 } },
//!   "root": {
//!     "type": "block",
//!     "children": [
//!       { "type": "block", "useStyles": ["body"],
//!         "children": [{ "type": "text", "content": "Hello" }] }
//!     ]
//!   }
//! }
//! ```

use crate::error::FlowboxError;
use flowbox_layout::{BoxId, BoxTree, ComputedStyle, compute_style, get_default_style};
use flowbox_style::display::Display;
use flowbox_style::stylesheet::{ElementStyle, PageMasters};
use flowbox_types::Size;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSource {
    #[serde(default)]
    pub styles: HashMap<String, ElementStyle>,
    /// Page masters for this document; the pipeline's own are used otherwise.
    #[serde(default)]
    pub page_masters: Option<PageMasters>,
    #[serde(default)]
    pub root: NodeSource,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeType {
    Block,
    Inline,
    Text { content: String },
    /// An atomic box with a fixed intrinsic size, such as an image.
    Replaced { width: f32, height: f32 },
    LineBreak,
}

impl NodeType {
    fn name(&self) -> &'static str {
        match self {
            NodeType::Block => "block",
            NodeType::Inline => "inline",
            NodeType::Text { .. } => "text",
            NodeType::Replaced { .. } => "replaced",
            NodeType::LineBreak => "line-break",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeSource {
    #[serde(flatten)]
    pub node: NodeType,
    /// Named styles applied in order, later names winning.
    #[serde(default)]
    pub use_styles: Vec<String>,
    /// Inline declarations, applied over the named styles.
    #[serde(default)]
    pub style: Option<ElementStyle>,
    /// List marker text for `display: list-item` blocks.
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeSource>,
}

impl Default for NodeSource {
    fn default() -> Self {
        Self {
            node: NodeType::Block,
            use_styles: Vec::new(),
            style: None,
            marker: None,
            children: Vec::new(),
        }
    }
}

impl DocumentSource {
    pub fn from_json(json: &str) -> Result<Self, FlowboxError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the box tree, computing every style against its parent's.
    pub fn build(&self) -> Result<(BoxTree, BoxId), FlowboxError> {
        if self.root.node != NodeType::Block {
            return Err(FlowboxError::InvalidRoot(self.root.node.name()));
        }
        let styles: HashMap<&str, Arc<ElementStyle>> = self
            .styles
            .iter()
            .map(|(name, style)| (name.as_str(), Arc::new(style.clone())))
            .collect();

        let mut tree = BoxTree::new();
        let root = add_node(&mut tree, &styles, &self.root, &get_default_style())?;
        debug!("Built box tree with {} boxes", tree.len());
        Ok((tree, root))
    }
}

fn add_node(
    tree: &mut BoxTree,
    styles: &HashMap<&str, Arc<ElementStyle>>,
    source: &NodeSource,
    parent_style: &Arc<ComputedStyle>,
) -> Result<BoxId, FlowboxError> {
    let style = resolve_style(styles, source, parent_style)?;
    let id = match &source.node {
        NodeType::Block => tree.add_block(style.clone()),
        NodeType::Inline => tree.add_inline(style.clone()),
        NodeType::Text { content } => tree.add_text(style.clone(), content),
        NodeType::Replaced { width, height } => tree.add_replaced(style.clone(), Size::new(*width, *height)),
        NodeType::LineBreak => tree.add_line_break(style.clone()),
    };
    if let Some(marker) = &source.marker {
        tree.set_marker(id, marker)?;
    }
    for child in &source.children {
        let child_id = add_node(tree, styles, child, &style)?;
        tree.append_child(id, child_id)?;
    }
    Ok(id)
}

fn resolve_style(
    styles: &HashMap<&str, Arc<ElementStyle>>,
    source: &NodeSource,
    parent_style: &Arc<ComputedStyle>,
) -> Result<Arc<ComputedStyle>, FlowboxError> {
    let named = source
        .use_styles
        .iter()
        .map(|name| {
            styles
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| FlowboxError::UnknownStyle(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Block nodes without a declared display are blocks, not inlines.
    let declared_display = named
        .iter()
        .filter_map(|s| s.display)
        .chain(source.style.as_ref().and_then(|s| s.display))
        .last();
    if source.node == NodeType::Block && declared_display.is_none() {
        let mut style = source.style.clone().unwrap_or_default();
        style.display = Some(Display::Block);
        return Ok(compute_style(&named, Some(&style), parent_style));
    }
    Ok(compute_style(&named, source.style.as_ref(), parent_style))
}
