use crate::LayoutError;
use crate::config::LayoutConfig;
use crate::engine::LayoutEngine;
use crate::interface::{LayoutContext, LayoutServices};
use crate::output::LaidOutDocument;
use crate::style::{ComputedStyle, compute_style, get_default_style};
use crate::text::{FixedPitchMeasurer, UnicodeBidiSplitter, UnicodeBoundary};
use crate::tree::{BoxKind, BoxTree};
use flowbox_style::FontSpec;
use flowbox_style::dimension::{Margins, PageSize};
use flowbox_style::display::Display;
use flowbox_style::stylesheet::{ElementStyle, PageMasters};
use flowbox_traits::{FontMetrics, TextMeasurer};
use flowbox_types::{BoxId, Size};
use std::sync::Arc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn block_style() -> ElementStyle {
    ElementStyle {
        display: Some(Display::Block),
        ..Default::default()
    }
}

/// Gives every word 60pt and every space nothing, so line breaking depends
/// only on the word count.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordMeasurer;

impl TextMeasurer for WordMeasurer {
    fn text_width(&self, _font: &FontSpec, text: &str) -> f32 {
        text.split(' ').filter(|w| !w.is_empty()).count() as f32 * 60.0
    }

    fn metrics(&self, font: &FontSpec) -> FontMetrics {
        FixedPitchMeasurer::default().metrics(font)
    }
}

/// A box tree under construction plus everything needed to lay it out.
///
/// Pages are `width` x `height` with no margins, so content coordinates
/// and page coordinates coincide on the first page.
pub struct TestDocument {
    pub tree: BoxTree,
    pub root: BoxId,
    pub services: LayoutServices,
    pub masters: PageMasters,
    pub config: LayoutConfig,
    width: f32,
}

impl TestDocument {
    pub fn new(width: f32, height: f32) -> Self {
        init_logger();
        let mut tree = BoxTree::new();
        let root = tree.add_block(Self::computed(&block_style(), &get_default_style()));
        Self {
            tree,
            root,
            services: LayoutServices {
                measurer: Arc::new(FixedPitchMeasurer::default()),
                boundary: Arc::new(UnicodeBoundary),
                bidi: Some(Arc::new(UnicodeBidiSplitter)),
            },
            masters: PageMasters::single(PageSize::Custom { width, height }, Margins::all(0.0)),
            config: LayoutConfig::default(),
            width,
        }
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.services.measurer = measurer;
        self
    }

    pub fn unpaginated(mut self) -> Self {
        self.config.paginate = false;
        self
    }

    fn computed(style: &ElementStyle, parent: &Arc<ComputedStyle>) -> Arc<ComputedStyle> {
        compute_style(&[Arc::new(style.clone())], None, parent)
    }

    /// A style computed against the default style.
    pub fn style(&self, style: &ElementStyle) -> Arc<ComputedStyle> {
        Self::computed(style, &get_default_style())
    }

    fn parent_style(&self, parent: BoxId) -> Arc<ComputedStyle> {
        self.tree.style(parent).unwrap_or_else(|_| get_default_style())
    }

    fn attach(&mut self, parent: BoxId, kind: BoxKind, style: &ElementStyle) -> BoxId {
        let style = Self::computed(style, &self.parent_style(parent));
        let id = self.tree.add(kind, style);
        self.tree.append_child(parent, id).expect("test parent exists");
        id
    }

    pub fn block(&mut self, parent: BoxId) -> BoxId {
        self.block_with(parent, &block_style())
    }

    pub fn block_with(&mut self, parent: BoxId, style: &ElementStyle) -> BoxId {
        self.attach(parent, BoxKind::Block, style)
    }

    pub fn text(&mut self, parent: BoxId, text: &str) -> BoxId {
        self.attach(parent, BoxKind::Text(Arc::from(text)), &ElementStyle::default())
    }

    pub fn line_break(&mut self, parent: BoxId) -> BoxId {
        self.attach(parent, BoxKind::LineBreak, &ElementStyle::default())
    }

    pub fn replaced(&mut self, parent: BoxId, width: f32, height: f32, style: &ElementStyle) -> BoxId {
        self.attach(parent, BoxKind::Replaced(Size::new(width, height)), style)
    }

    /// A block containing `text`, the usual paragraph.
    pub fn paragraph(&mut self, parent: BoxId, text: &str) -> BoxId {
        let p = self.block(parent);
        self.text(p, text);
        p
    }

    fn prepare_root(tree: &mut BoxTree, root: BoxId, width: f32) {
        if let Ok(b) = tree.get_mut(root) {
            b.geometry.content_width = width;
        }
    }

    /// Runs `f` against a fresh context whose root spans the page width.
    pub fn with_context<R>(&mut self, f: impl FnOnce(&mut LayoutContext<'_>) -> R) -> R {
        Self::prepare_root(&mut self.tree, self.root, self.width);
        let mut ctx = LayoutContext::new(
            &mut self.tree,
            &self.services,
            self.config,
            Arc::new(self.masters.clone()),
            None,
        );
        f(&mut ctx)
    }

    /// Like `with_context`, over a copy of the tree.
    pub fn with_context_ref<R>(&self, f: impl FnOnce(&LayoutContext<'_>) -> R) -> R {
        let mut tree = self.tree.clone();
        Self::prepare_root(&mut tree, self.root, self.width);
        let ctx = LayoutContext::new(
            &mut tree,
            &self.services,
            self.config,
            Arc::new(self.masters.clone()),
            None,
        );
        f(&ctx)
    }

    pub fn engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.services.measurer.clone())
            .with_boundary(self.services.boundary.clone())
            .with_bidi(self.services.bidi.clone())
            .with_page_masters(self.masters.clone())
            .with_config(self.config)
    }

    pub fn try_layout(&mut self) -> Result<LaidOutDocument, LayoutError> {
        let engine = self.engine();
        engine.layout(&mut self.tree, self.root)
    }

    pub fn layout(&mut self) -> LaidOutDocument {
        self.try_layout().expect("layout succeeds")
    }

    /// The text of each line of `block`, in visual order.
    pub fn line_texts(&self, block: BoxId) -> Vec<String> {
        self.tree
            .get(block)
            .map(|b| b.lines.iter().map(|l| l.text()).collect())
            .unwrap_or_default()
    }
}
