use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::component::{surface_name, Component, TypeTagChain};
use crate::config::{RendererConfig, RendererOverrides};
use crate::document::generate_document;
use crate::lifecycle::{PrintCycle, PrintOutcome, Scheduler, ThreadScheduler};
use crate::registry::{RendererId, RendererRegistry};
use crate::renderer::{builtin_factories, BodyFragmentProducer, RenderError, RendererFactory};
use crate::surface::SurfaceHost;

/// Errors raised on the document-only path. Printing itself reports a [`PrintOutcome`].
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("no renderer registered for type tags '{0}'")]
    NoRenderer(String),
    #[error("renderer '{0}' has no factory")]
    MissingFactory(RendererId),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Dispatches components to renderers and drives the print lifecycle.
/// 依元件型別分派渲染器並驅動列印流程。
pub struct PrintManager {
    registry: RwLock<RendererRegistry>,
    factories: RwLock<HashMap<RendererId, RendererFactory>>,
    defaults: RendererConfig,
    scheduler: Arc<dyn Scheduler>,
}

impl Default for PrintManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintManager {
    /// Manager with the built-in chart, grid, panel and tree renderers.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(RendererRegistry::with_defaults()),
            factories: RwLock::new(builtin_factories()),
            defaults: RendererConfig::default(),
            scheduler: Arc::new(ThreadScheduler),
        }
    }

    pub fn with_defaults(mut self, defaults: RendererConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Arc::new(scheduler);
        self
    }

    pub fn defaults(&self) -> &RendererConfig {
        &self.defaults
    }

    /// Registers `renderer` for components tagged `tag`; the last registration wins.
    pub fn register_renderer(&self, tag: impl Into<String>, renderer: impl Into<RendererId>) {
        self.registry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .register(tag, renderer);
    }

    /// Makes a renderer family available under `id`.
    pub fn register_factory<F>(&self, id: impl Into<RendererId>, factory: F)
    where
        F: Fn() -> Box<dyn BodyFragmentProducer> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id.into(), Arc::new(factory));
    }

    /// Copy of the current tag registrations.
    pub fn registry(&self) -> RendererRegistry {
        self.registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Renderer of the most specific registered tag of `component`.
    pub fn resolve(&self, component: &dyn Component) -> Option<RendererId> {
        let chain = TypeTagChain::parse(component.type_tags())?;
        let registry = self
            .registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (tag, renderer) = registry.resolve(&chain)?;
        debug!("component '{}' ({chain}) resolved via '{tag}' to {renderer}", component.id());
        Some(renderer.clone())
    }

    fn instantiate(
        &self,
        component: &dyn Component,
    ) -> Result<Box<dyn BodyFragmentProducer>, PrintError> {
        let renderer = self
            .resolve(component)
            .ok_or_else(|| PrintError::NoRenderer(component.type_tags().to_string()))?;
        let factory = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&renderer)
            .cloned()
            .ok_or(PrintError::MissingFactory(renderer))?;
        Ok(factory())
    }

    /// Generates the printable document without opening a surface.
    pub fn render(
        &self,
        component: &dyn Component,
        overrides: &RendererOverrides,
    ) -> Result<String, PrintError> {
        let producer = self.instantiate(component)?;
        let config = self.defaults.merged(overrides);
        Ok(generate_document(producer.as_ref(), component, &config)?)
    }

    /// Prints `component` into a surface opened on `host`.
    ///
    /// Never fails: unresolvable components, refused or lost surfaces and
    /// rendering errors all end in a non-printed [`PrintOutcome`].
    pub fn print<H: SurfaceHost>(
        &self,
        component: &dyn Component,
        overrides: &RendererOverrides,
        host: &H,
    ) -> PrintOutcome {
        let document = match self.render(component, overrides) {
            Ok(document) => document,
            Err(PrintError::NoRenderer(tags)) => {
                warn!("no renderer for '{}' ({tags}); print dropped", component.id());
                return PrintOutcome::NoRenderer;
            }
            Err(PrintError::MissingFactory(renderer)) => {
                warn!("renderer {renderer} has no factory; print dropped");
                return PrintOutcome::MissingFactory(renderer);
            }
            Err(PrintError::Render(err)) => {
                warn!("rendering '{}' failed: {err}", component.id());
                return PrintOutcome::RenderFailed(err.to_string());
            }
        };

        let config = self.defaults.merged(overrides);
        let name = surface_name(component);
        let mut cycle = PrintCycle::begin(host, &name, &document, &config);
        cycle.run(self.scheduler.as_ref())
    }
}

static GLOBAL: Lazy<PrintManager> = Lazy::new(PrintManager::new);

/// Process-wide manager used by [`print`] and [`register_renderer`].
pub fn global() -> &'static PrintManager {
    &GLOBAL
}

/// Prints `component` with the process-wide manager.
pub fn print<H: SurfaceHost>(
    component: &dyn Component,
    overrides: &RendererOverrides,
    host: &H,
) -> PrintOutcome {
    global().print(component, overrides, host)
}

/// Registers a renderer on the process-wide manager.
pub fn register_renderer(tag: impl Into<String>, renderer: impl Into<RendererId>) {
    global().register_renderer(tag, renderer);
}
