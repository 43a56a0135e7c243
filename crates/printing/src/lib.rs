//! Turns host components (charts, panels, grids, trees) into standalone printable
//! documents and drives the print surface lifecycle.

pub mod component;
pub mod config;
pub mod document;
pub mod lifecycle;
pub mod manager;
pub mod registry;
pub mod renderer;
pub mod snapshot;
pub mod surface;
pub mod template;

pub use component::{
    surface_name, CellFormatter, ColumnDescriptor, Component, FormatContext, Record,
    RowBodyElement, TableSource, TreeNode, TreeSource, TypeTagChain,
};
pub use config::{
    ReadinessPolicy, RendererConfig, RendererOverrides, StyleSheets, TimeoutFallback,
};
pub use document::{assemble, generate_document, FALLBACK_TITLE, PROBE_ELEMENT_ID};
pub use lifecycle::{
    ImmediateScheduler, PrintCycle, PrintOutcome, Scheduler, ThreadScheduler, Tick,
};
pub use manager::{print, register_renderer, PrintError, PrintManager};
pub use registry::{RendererId, RendererRegistry};
pub use renderer::{
    BodyFragmentProducer, ChartRenderer, GridRenderer, PanelRenderer, RenderError,
    RendererFactory, RowRecord, TreeRenderer,
};
pub use snapshot::{
    ColumnSnapshot, ComponentSnapshot, GridSnapshot, NodeSnapshot, RowBodySnapshot,
    SnapshotError, TreeSnapshot,
};
pub use surface::{DirectorySurface, DirectorySurfaceHost, PrintSurface, SurfaceHost};
pub use template::{Template, TemplateCache, TemplateError, TemplateSegment};
