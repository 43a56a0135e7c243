//! Body-fragment producers for each printable component family.

pub mod chart;
pub mod grid;
pub mod panel;
pub mod table;
pub mod tree;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::component::Component;
use crate::registry::RendererId;
use crate::template::TemplateError;

pub use chart::ChartRenderer;
pub use grid::GridRenderer;
pub use panel::PanelRenderer;
pub use tree::TreeRenderer;

/// One flattened row handed from data preparation to fragment generation.
/// 從資料準備階段傳遞到片段產生階段的單一列資料。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    /// Formatted display value per data index.
    pub values: HashMap<String, String>,
    /// Secondary expanded-row markup spanning the whole table width.
    pub row_body: Option<String>,
    /// Depth indentation for hierarchical rows.
    pub indent: Option<String>,
}

impl RowRecord {
    pub fn value(&self, data_index: &str) -> Option<&str> {
        self.values.get(data_index).map(String::as_str)
    }
}

/// Errors raised while producing a body fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("component '{component}' does not expose {capability} data")]
    MissingCapability {
        component: String,
        capability: &'static str,
    },
    #[error("invalid renderer template: {0}")]
    Template(#[from] TemplateError),
}

/// Capability implemented by every renderer: turn a component into a body fragment.
/// 所有渲染器皆需實作的能力：將元件轉為 body 片段。
pub trait BodyFragmentProducer: Send + Sync {
    /// Extracts structured rows for the fragment. Markup-only renderers keep the default.
    fn prepare_render_data(
        &self,
        component: &dyn Component,
    ) -> Result<Vec<RowRecord>, RenderError> {
        let _ = component;
        Ok(Vec::new())
    }

    /// Produces a self-contained HTML fragment without `<html>`, `<head>` or `<body>`.
    fn body_fragment(
        &self,
        component: &dyn Component,
        rows: &[RowRecord],
    ) -> Result<String, RenderError>;
}

/// Creates a fresh renderer instance for a single print call.
pub type RendererFactory = Arc<dyn Fn() -> Box<dyn BodyFragmentProducer> + Send + Sync>;

/// Factories for the built-in renderer families.
pub fn builtin_factories() -> HashMap<RendererId, RendererFactory> {
    let mut factories: HashMap<RendererId, RendererFactory> = HashMap::new();
    factories.insert(
        RendererId::CHART,
        Arc::new(|| Box::new(ChartRenderer) as Box<dyn BodyFragmentProducer>),
    );
    factories.insert(
        RendererId::GRID,
        Arc::new(|| Box::new(GridRenderer::default()) as Box<dyn BodyFragmentProducer>),
    );
    factories.insert(
        RendererId::PANEL,
        Arc::new(|| Box::new(PanelRenderer) as Box<dyn BodyFragmentProducer>),
    );
    factories.insert(
        RendererId::TREE,
        Arc::new(|| Box::new(TreeRenderer::default()) as Box<dyn BodyFragmentProducer>),
    );
    factories
}

pub(crate) fn missing_capability(
    component: &dyn Component,
    capability: &'static str,
) -> RenderError {
    RenderError::MissingCapability {
        component: component.id().to_string(),
        capability,
    }
}
