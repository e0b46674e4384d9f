use crate::LayoutError;
use crate::config::LayoutConfig;
use crate::interface::{LayoutContext, LayoutServices};
use crate::nodes::block::{BlockInput, layout_block_box};
use crate::nodes::positioned::layout_remaining_absolutes;
use crate::output::{self, LaidOutDocument};
use crate::style::{self, ComputedStyle};
use crate::text::{UnicodeBidiSplitter, UnicodeBoundary};
use crate::tree::BoxTree;
use flowbox_style::dimension::{Margins, PageSize};
use flowbox_style::stylesheet::{ElementStyle, PageMasters};
use flowbox_traits::{BidiSplitter, TextBoundary, TextMeasurer};
use flowbox_types::{BoxId, Point};
use std::sync::Arc;
use std::time::Instant;

/// Lays out box trees onto pages.
///
/// The engine holds the text services, page masters and configuration;
/// everything mutable lives in the `LayoutContext` of a single `layout`
/// call, so one engine can lay out any number of trees.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    services: LayoutServices,
    masters: Arc<PageMasters>,
    config: LayoutConfig,
}

impl LayoutEngine {
    /// An engine with the Unicode boundary and bidi services, A4 pages
    /// with 36pt margins and the default configuration.
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            services: LayoutServices {
                measurer,
                boundary: Arc::new(UnicodeBoundary),
                bidi: Some(Arc::new(UnicodeBidiSplitter)),
            },
            masters: Arc::new(PageMasters::single(PageSize::A4, Margins::all(36.0))),
            config: LayoutConfig::default(),
        }
    }

    pub fn with_boundary(mut self, boundary: Arc<dyn TextBoundary>) -> Self {
        self.services.boundary = boundary;
        self
    }

    /// `None` treats every text box as a single left-to-right run.
    pub fn with_bidi(mut self, bidi: Option<Arc<dyn BidiSplitter>>) -> Self {
        self.services.bidi = bidi;
        self
    }

    pub fn with_page_masters(mut self, masters: PageMasters) -> Self {
        self.masters = Arc::new(masters);
        self
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn page_masters(&self) -> &PageMasters {
        &self.masters
    }

    pub fn compute_style(
        &self,
        style_sets: &[Arc<ElementStyle>],
        style_override: Option<&ElementStyle>,
        parent_style: &Arc<ComputedStyle>,
    ) -> Arc<ComputedStyle> {
        style::compute_style(style_sets, style_override, parent_style)
    }

    pub fn get_default_style(&self) -> Arc<ComputedStyle> {
        style::get_default_style()
    }

    /// Lays out the tree under `root`, which must be a parentless block.
    ///
    /// Geometry is written into the tree; the returned document describes
    /// the pages. Any previous layout of the tree is discarded first, so
    /// calling this twice gives the same result.
    pub fn layout(&self, tree: &mut BoxTree, root: BoxId) -> Result<LaidOutDocument, LayoutError> {
        let start = Instant::now();
        tree.validate(root)?;
        tree.reset_subtree(root);

        let root_style = tree.style(root)?;
        let mut ctx = LayoutContext::new(
            tree,
            &self.services,
            self.config,
            self.masters.clone(),
            root_style.paging.page.clone(),
        );

        let first_page = ctx.page_index(0.0);
        let width = ctx.pages.page(first_page).map_or(0.0, |p| p.content_width());
        layout_block_box(
            &mut ctx,
            root,
            BlockInput::in_flow(Point::new(0.0, 0.0), width, root_style.box_model.margin.top),
        )?;
        layout_remaining_absolutes(&mut ctx)?;

        if !ctx.config.paginate {
            let g = ctx.tree.geometry(root)?;
            let reserved = ctx.pages.page(0).map_or(0.0, |p| p.footnote_reserved);
            ctx.pages.extend_last(g.abs_bottom() + g.margin.bottom + reserved);
        }

        let placements = ctx.footnotes.placements(&ctx.pages);
        for placement in &placements {
            let g = ctx.tree.geometry(placement.body)?;
            let page_top = ctx.pages.page(placement.page_index).map_or(0.0, |p| p.top);
            let target = placement.y + g.margin.top;
            ctx.tree.translate_subtree(placement.body, 0.0, target - g.abs_y);
            ctx.tree.get_mut(placement.body)?.geometry.y = target - page_top;
        }

        let (pages, _, mut stats) = ctx.finish();
        stats.pages_created = pages.created();
        let document = output::build_document(tree, root, &pages, placements, stats)?;
        log::debug!(
            "Laid out {} box(es) onto {} page(s) in {:.2?}",
            tree.len(),
            document.page_count(),
            start.elapsed()
        );
        document.stats.log_summary();
        Ok(document)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(Arc::new(crate::text::FixedPitchMeasurer::default()))
    }
}
