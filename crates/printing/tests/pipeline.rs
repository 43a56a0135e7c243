use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use uxprinter_printing::{
    ColumnDescriptor, Component, ImmediateScheduler, PrintManager, PrintOutcome, PrintSurface,
    Record, RendererOverrides, RowBodyElement, SurfaceHost, TableSource, TimeoutFallback,
};

/// Grid-like host component backed by plain vectors.
struct OrdersGrid {
    records: Vec<Record>,
    expanded: Vec<RowBodyElement>,
}

impl OrdersGrid {
    fn new() -> Self {
        let records = [
            json!({"customer": "Acme", "total": 1250.5, "internal": "x"}),
            json!({"customer": "Globex", "total": 99}),
        ]
        .into_iter()
        .filter_map(|value| value.as_object().cloned())
        .collect();
        Self {
            records,
            expanded: vec![
                RowBodyElement::visible("<em>rush order</em>"),
                RowBodyElement::hidden("<em>never shown</em>"),
            ],
        }
    }
}

impl Component for OrdersGrid {
    fn type_tags(&self) -> &str {
        "component/container/panel/tablepanel/gridpanel"
    }

    fn id(&self) -> &str {
        "orders-grid"
    }

    fn title(&self) -> Option<String> {
        Some("Orders".into())
    }

    fn as_table(&self) -> Option<&dyn TableSource> {
        Some(self)
    }
}

impl TableSource for OrdersGrid {
    fn visible_columns(&self, _refresh: bool) -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::non_data(""),
            ColumnDescriptor::new("customer", "Customer"),
            ColumnDescriptor::new("total", "Total").with_formatter(|value: &Value, ctx| {
                format!("${:.2} (row {})", value.as_f64().unwrap_or_default(), ctx.row_index)
            }),
        ]
    }

    fn records(&self) -> Vec<Record> {
        self.records.clone()
    }

    fn row_bodies(&self) -> Vec<RowBodyElement> {
        self.expanded.clone()
    }
}

#[derive(Debug, Clone, Default)]
struct RecordedSurface {
    name: String,
    html: String,
    finalized: bool,
    probes: u32,
    printed: u32,
    closed: bool,
}

/// Host that keeps every surface it opened, with a fixed number of "styles pending" probes.
#[derive(Clone, Default)]
struct RecordingHost {
    surfaces: Arc<Mutex<Vec<RecordedSurface>>>,
    pending_probes: u32,
}

struct RecordingSurface {
    index: usize,
    pending_probes: u32,
    sink: Arc<Mutex<Vec<RecordedSurface>>>,
}

impl RecordingSurface {
    fn update(&self, apply: impl FnOnce(&mut RecordedSurface)) {
        let mut surfaces = self.sink.lock().expect("lock poisoned");
        apply(&mut surfaces[self.index]);
    }
}

impl SurfaceHost for RecordingHost {
    type Surface = RecordingSurface;

    fn open(&self, name: &str) -> Option<RecordingSurface> {
        let mut surfaces = self.surfaces.lock().expect("lock poisoned");
        surfaces.push(RecordedSurface {
            name: name.to_string(),
            ..RecordedSurface::default()
        });
        Some(RecordingSurface {
            index: surfaces.len() - 1,
            pending_probes: self.pending_probes,
            sink: self.surfaces.clone(),
        })
    }
}

impl PrintSurface for RecordingSurface {
    fn write(&mut self, html: &str) {
        self.update(|surface| surface.html.push_str(html));
    }

    fn finalize(&mut self) {
        self.update(|surface| surface.finalized = true);
    }

    fn probe_display(&self, element_id: &str) -> Option<String> {
        assert_eq!(element_id, "csscheck");
        let mut probes = 0;
        self.update(|surface| {
            surface.probes += 1;
            probes = surface.probes;
        });
        let display = if probes > self.pending_probes { "none" } else { "block" };
        Some(display.to_string())
    }

    fn print(&mut self) {
        self.update(|surface| surface.printed += 1);
    }

    fn close(&mut self) {
        self.update(|surface| surface.closed = true);
    }
}

fn manager() -> PrintManager {
    PrintManager::new().with_scheduler(ImmediateScheduler)
}

#[test]
fn grid_prints_once_styles_settle() {
    let host = RecordingHost {
        pending_probes: 3,
        ..RecordingHost::default()
    };
    let outcome = manager().print(&OrdersGrid::new(), &RendererOverrides::default(), &host);

    assert_eq!(
        outcome,
        PrintOutcome::Printed {
            surface: "print_gridpanel_orders_grid".into(),
            forced: false,
            via_quirk: false,
            closed: true,
        }
    );
    let surfaces = host.surfaces.lock().unwrap();
    assert_eq!(surfaces.len(), 1);
    let surface = &surfaces[0];
    assert!(surface.finalized);
    assert_eq!(surface.probes, 4);
    assert_eq!(surface.printed, 1);
    assert!(surface.closed);

    let html = &surface.html;
    assert!(html.contains("<title>Orders</title>"));
    assert!(html.contains("<thead><tr><th>Customer</th><th>Total</th></tr></thead>"));
    assert!(html.contains("<tr><td>Acme</td><td>$1250.50 (row 0)</td></tr>"));
    assert!(html.contains("<tr><td colspan=\"3\"><em>rush order</em></td></tr>"));
    assert!(html.contains("<tr><td>Globex</td><td>$99.00 (row 1)</td></tr>"));
    assert!(!html.contains("never shown"));
    assert!(!html.contains("internal"));
}

#[test]
fn timeout_policy_applies_per_call() {
    let host = RecordingHost {
        pending_probes: u32::MAX,
        ..RecordingHost::default()
    };
    let overrides = RendererOverrides {
        max_poll_attempts: Some(5),
        ..RendererOverrides::default()
    };
    let outcome = manager().print(&OrdersGrid::new(), &overrides, &host);
    assert_eq!(
        outcome,
        PrintOutcome::TimedOut {
            surface: "print_gridpanel_orders_grid".into()
        }
    );

    let forced = RendererOverrides {
        on_timeout: Some(TimeoutFallback::PrintAnyway),
        auto_close: Some(false),
        ..overrides
    };
    let outcome = manager().print(&OrdersGrid::new(), &forced, &host);
    assert!(matches!(
        outcome,
        PrintOutcome::Printed {
            forced: true,
            closed: false,
            ..
        }
    ));

    let surfaces = host.surfaces.lock().unwrap();
    assert_eq!(surfaces.len(), 2);
    assert_eq!(surfaces[0].printed, 0);
    assert_eq!(surfaces[1].printed, 1);
    assert!(!surfaces[1].closed);
}

#[test]
fn render_and_print_write_the_same_document() {
    let manager = manager();
    let host = RecordingHost::default();
    let grid = OrdersGrid::new();
    let document = manager.render(&grid, &RendererOverrides::default()).unwrap();
    assert!(manager
        .print(&grid, &RendererOverrides::default(), &host)
        .is_printed());
    assert_eq!(host.surfaces.lock().unwrap()[0].html, document);
}
