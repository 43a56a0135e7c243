use std::borrow::Cow;
use std::collections::HashMap;

use log::debug;

use crate::component::TypeTagChain;

/// Identifier of a renderer family.
/// （渲染器類別的識別子。）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(Cow<'static, str>);

impl RendererId {
    pub const CHART: RendererId = RendererId(Cow::Borrowed("chart"));
    pub const GRID: RendererId = RendererId(Cow::Borrowed("grid"));
    pub const PANEL: RendererId = RendererId(Cow::Borrowed("panel"));
    pub const TREE: RendererId = RendererId(Cow::Borrowed("tree"));

    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RendererId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for RendererId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for RendererId {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for RendererId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Maps component type tags to renderer identifiers.
/// （將元件型別標籤對應到渲染器識別子的註冊表。）
#[derive(Debug, Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, RendererId>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry preloaded with the chart, grid, panel and tree renderers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("chart", RendererId::CHART);
        registry.register("gridpanel", RendererId::GRID);
        registry.register("panel", RendererId::PANEL);
        registry.register("treepanel", RendererId::TREE);
        registry
    }

    /// Upserts the renderer for `tag`; the last registration wins.
    pub fn register(&mut self, tag: impl Into<String>, renderer: impl Into<RendererId>) {
        let tag = tag.into();
        let renderer = renderer.into();
        if let Some(previous) = self.renderers.insert(tag.clone(), renderer.clone()) {
            if previous != renderer {
                debug!("renderer for '{tag}' replaced: {previous} -> {renderer}");
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&RendererId> {
        self.renderers.get(tag)
    }

    /// Finds the renderer of the most specific registered tag in `chain`.
    pub fn resolve<'c>(&self, chain: &'c TypeTagChain) -> Option<(&'c str, &RendererId)> {
        chain
            .specific_first()
            .find_map(|tag| self.renderers.get(tag).map(|renderer| (tag, renderer)))
    }

    /// Registered `(tag, renderer)` pairs sorted by tag.
    pub fn entries(&self) -> Vec<(&str, &RendererId)> {
        let mut entries: Vec<_> = self
            .renderers
            .iter()
            .map(|(tag, renderer)| (tag.as_str(), renderer))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}
