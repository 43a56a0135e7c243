use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::registry::RendererId;

/// Template segments in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    Literal(String),
    Placeholder(String),
}

/// Parsed `{name}` placeholder template. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<TemplateSegment>,
}

impl Template {
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut buffer = String::new();

        let mut chars = input.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    buffer.push('{');
                    chars.next();
                }
                '}' if chars.peek() == Some(&'}') => {
                    buffer.push('}');
                    chars.next();
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == '}' {
                            closed = true;
                            break;
                        }
                        name.push(next);
                    }
                    if !closed {
                        return Err(TemplateError::Unterminated(name));
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder);
                    }
                    flush_buffer(&mut buffer, &mut segments);
                    segments.push(TemplateSegment::Placeholder(name));
                }
                '}' => return Err(TemplateError::UnmatchedClose),
                other => buffer.push(other),
            }
        }

        flush_buffer(&mut buffer, &mut segments);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Names of all placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Placeholder(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Substitutes every placeholder; unresolved names render as empty strings.
    pub fn render<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => output.push_str(text),
                TemplateSegment::Placeholder(name) => {
                    if let Some(value) = lookup(name) {
                        output.push_str(&value);
                    }
                }
            }
        }
        output
    }
}

fn flush_buffer(buffer: &mut String, segments: &mut Vec<TemplateSegment>) {
    if buffer.is_empty() {
        return;
    }
    segments.push(TemplateSegment::Literal(std::mem::take(buffer)));
}

/// Escapes braces so the text survives a later template pass unchanged.
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Errors raised while parsing templates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated placeholder '{{{0}'")]
    Unterminated(String),
    #[error("empty placeholder '{{}}'")]
    EmptyPlaceholder,
    #[error("unmatched '}}' outside a placeholder")]
    UnmatchedClose,
}

/// Per-column cell templates of a table renderer family.
///
/// `header` is applied to each data column with `text` and `dataIndex` in scope.
/// `body` is applied the same way and must yield a template of its own, which is
/// then applied to every row record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTemplates {
    pub header: Template,
    pub body: Template,
}

impl CellTemplates {
    pub fn compile(header: &str, body: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            header: Template::parse(header)?,
            body: Template::parse(body)?,
        })
    }
}

/// Memoised cell templates keyed by renderer identity.
/// 依渲染器識別碼快取的欄位樣板。
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<RendererId, Arc<CellTemplates>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached templates for `id`, compiling them on first use.
    ///
    /// Racing callers may both compile; the first insert wins and both results are equal.
    pub fn get_or_compile<F>(
        &self,
        id: &RendererId,
        compile: F,
    ) -> Result<Arc<CellTemplates>, TemplateError>
    where
        F: FnOnce() -> Result<CellTemplates, TemplateError>,
    {
        {
            let guard = self
                .entries
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(templates) = guard.get(id) {
                return Ok(Arc::clone(templates));
            }
        }

        let compiled = Arc::new(compile()?);
        let mut guard = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = guard.entry(id.clone()).or_insert(compiled);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide cache shared by the built-in table and tree renderers.
pub fn shared_cache() -> &'static TemplateCache {
    static CACHE: Lazy<TemplateCache> = Lazy::new(TemplateCache::new);
    &CACHE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn parse_literals_and_placeholders() {
        let template = Template::parse("<td>{name}</td>").unwrap();
        assert_eq!(
            template.segments(),
            [
                TemplateSegment::Literal("<td>".into()),
                TemplateSegment::Placeholder("name".into()),
                TemplateSegment::Literal("</td>".into()),
            ]
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        let template = Template::parse("{{{dataIndex}}}").unwrap();
        let rendered = template.render(|name| (name == "dataIndex").then(|| "price".to_string()));
        assert_eq!(rendered, "{price}");
    }

    #[test]
    fn missing_values_render_empty() {
        let template = Template::parse("a{missing}b").unwrap();
        assert_eq!(template.render(|_| None), "ab");
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert_eq!(
            Template::parse("<td>{name"),
            Err(TemplateError::Unterminated("name".into()))
        );
        assert_eq!(Template::parse("{}"), Err(TemplateError::EmptyPlaceholder));
        assert_eq!(Template::parse("x}y"), Err(TemplateError::UnmatchedClose));
    }

    #[test]
    fn escaped_text_round_trips_through_a_second_pass() {
        let raw = "price {usd}";
        let template = Template::parse(&escape_braces(raw)).unwrap();
        assert_eq!(template.render(|_| None), raw);
    }

    #[test]
    fn cache_compiles_once_per_renderer() {
        let cache = TemplateCache::new();
        let id = RendererId::from("grid");
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache
                .get_or_compile(&id, || {
                    calls.set(calls.get() + 1);
                    CellTemplates::compile("<th>{text}</th>", "<td>{{{dataIndex}}}</td>")
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_compilation_is_not_cached() {
        let cache = TemplateCache::new();
        let id = RendererId::from("broken");
        let result = cache.get_or_compile(&id, || CellTemplates::compile("{", "{x}"));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
