use crate::component::Component;
use crate::renderer::{BodyFragmentProducer, RenderError, RowRecord};

/// Wraps the chart's rendered markup (typically an inline SVG) for printing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer;

impl BodyFragmentProducer for ChartRenderer {
    fn body_fragment(
        &self,
        component: &dyn Component,
        _rows: &[RowRecord],
    ) -> Result<String, RenderError> {
        Ok(format!(
            "<div class='x-chart-print'>{}</div>",
            component.element_html().unwrap_or_default()
        ))
    }
}
