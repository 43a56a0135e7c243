use crate::component::Component;
use crate::renderer::{BodyFragmentProducer, RenderError, RowRecord};

/// Wraps the panel body's rendered markup for printing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelRenderer;

impl BodyFragmentProducer for PanelRenderer {
    fn body_fragment(
        &self,
        component: &dyn Component,
        _rows: &[RowRecord],
    ) -> Result<String, RenderError> {
        let body = format!(
            "<div class=\"x-panel-print\">{}</div>",
            component.body_html().unwrap_or_default()
        );
        // Downstream template engines cannot interpolate literal line breaks.
        Ok(body.replace("\r\n", "").replace('\n', ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ComponentSnapshot;

    #[test]
    fn strips_line_breaks_from_body_markup() {
        let mut panel = ComponentSnapshot::new("component/container/panel", "notes");
        panel.body_html = Some("<p>one</p>\r\n<p>two</p>\n".into());
        let fragment = PanelRenderer.body_fragment(&panel, &[]).unwrap();
        assert_eq!(
            fragment,
            "<div class=\"x-panel-print\"><p>one</p><p>two</p></div>"
        );
    }

    #[test]
    fn falls_back_to_element_markup() {
        let panel = ComponentSnapshot::new("panel", "p").with_html("<em>all</em>");
        let fragment = PanelRenderer.body_fragment(&panel, &[]).unwrap();
        assert_eq!(fragment, "<div class=\"x-panel-print\"><em>all</em></div>");
    }
}
