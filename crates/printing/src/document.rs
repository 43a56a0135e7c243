use std::fmt::Write as _;

use crate::component::Component;
use crate::config::RendererConfig;
use crate::renderer::{BodyFragmentProducer, RenderError};

/// Id of the zero-size element whose computed style reveals when stylesheets applied.
pub const PROBE_ELEMENT_ID: &str = "csscheck";

/// Title used when the component has none or an empty one.
pub const FALLBACK_TITLE: &str = "Printing";

/// Builds the complete printable document for `component`.
/// 為元件建立完整的可列印 HTML 文件。
pub fn generate_document(
    producer: &dyn BodyFragmentProducer,
    component: &dyn Component,
    config: &RendererConfig,
) -> Result<String, RenderError> {
    let rows = producer.prepare_render_data(component)?;
    let body = producer.body_fragment(component, &rows)?;
    let title = component
        .title()
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());
    Ok(assemble(config, &title, &body))
}

/// Wraps a body fragment with doctype, head and the probe element.
pub fn assemble(config: &RendererConfig, title: &str, body_fragment: &str) -> String {
    let mut html = String::with_capacity(body_fragment.len() + 512);
    html.push_str(&config.doc_type);
    html.push_str("<html><head>");
    html.push_str("<meta content=\"text/html; charset=UTF-8\" http-equiv=\"Content-Type\" />");
    for href in &config.style_sheets {
        let _ = write!(
            html,
            "<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\" media=\"screen,print\" />",
            escape_attribute(href)
        );
    }
    let _ = write!(html, "<title>{title}</title></head>");
    let _ = write!(
        html,
        "<body class=\"{}\"><div id=\"{PROBE_ELEMENT_ID}\"></div>{body_fragment}</body></html>",
        escape_attribute(&config.base_cls)
    );
    html
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}
