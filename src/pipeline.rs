use crate::document::DocumentSource;
use crate::error::FlowboxError;
use flowbox_layout::text::FixedPitchMeasurer;
use flowbox_layout::{BoxId, BoxTree, LaidOutDocument, LayoutConfig, LayoutEngine};
use flowbox_style::stylesheet::PageMasters;
use flowbox_traits::TextMeasurer;
use log::info;
use std::sync::Arc;

/// A laid-out box tree together with its page structure.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub tree: BoxTree,
    pub root: BoxId,
    pub document: LaidOutDocument,
}

impl LayoutResult {
    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }
}

/// Turns JSON document descriptions into paginated layouts.
#[derive(Debug, Clone)]
pub struct LayoutPipeline {
    engine: LayoutEngine,
}

impl LayoutPipeline {
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            engine: LayoutEngine::new(measurer),
        }
    }

    pub fn from_engine(engine: LayoutEngine) -> Self {
        Self { engine }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.engine = self.engine.with_config(config);
        self
    }

    pub fn with_page_masters(mut self, masters: PageMasters) -> Self {
        self.engine = self.engine.with_page_masters(masters);
        self
    }

    pub fn with_page_masters_json(self, json: &str) -> Result<Self, FlowboxError> {
        let masters = PageMasters::from_json(json)?;
        Ok(self.with_page_masters(masters))
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn layout_json(&self, json: &str) -> Result<LayoutResult, FlowboxError> {
        let source = DocumentSource::from_json(json)?;
        self.layout_source(&source)
    }

    pub fn layout_source(&self, source: &DocumentSource) -> Result<LayoutResult, FlowboxError> {
        let (mut tree, root) = source.build()?;
        let document = match &source.page_masters {
            Some(masters) => self
                .engine
                .clone()
                .with_page_masters(masters.clone())
                .layout(&mut tree, root)?,
            None => self.engine.layout(&mut tree, root)?,
        };
        info!(
            "Laid out {} boxes onto {} page(s)",
            tree.len(),
            document.page_count()
        );
        Ok(LayoutResult {
            tree,
            root,
            document,
        })
    }
}

impl Default for LayoutPipeline {
    fn default() -> Self {
        Self::new(Arc::new(FixedPitchMeasurer::default()))
    }
}
