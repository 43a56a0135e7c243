use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stylesheet every printed document links first.
pub const DEFAULT_STYLE_SHEET: &str = "/resources/css/printer.css";

/// CSS class applied to the printed `<body>`.
pub const DEFAULT_BASE_CLS: &str = "dvp-printer";

/// XHTML 1.0 Strict document type declaration.
pub const DEFAULT_DOC_TYPE: &str = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 500;

/// What to do when stylesheets never report as applied.
/// 樣式表遲遲未套用時的處理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutFallback {
    /// Leave the surface unprinted.
    #[default]
    Abort,
    /// Print with whatever styling has been applied so far.
    PrintAnyway,
}

/// Bounds on the stylesheet readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessPolicy {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub on_timeout: TimeoutFallback,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_poll_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            on_timeout: TimeoutFallback::Abort,
        }
    }
}

impl ReadinessPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Effective configuration of one renderer instance.
/// 單一渲染器實例的有效設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererConfig {
    /// Close the surface once native print returns.
    #[serde(default = "default_true")]
    pub auto_close: bool,
    #[serde(default = "default_base_cls")]
    pub base_cls: String,
    #[serde(default = "default_style_sheets")]
    pub style_sheets: Vec<String>,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default)]
    pub readiness: ReadinessPolicy,
}

fn default_true() -> bool {
    true
}

fn default_base_cls() -> String {
    DEFAULT_BASE_CLS.to_string()
}

fn default_style_sheets() -> Vec<String> {
    vec![DEFAULT_STYLE_SHEET.to_string()]
}

fn default_doc_type() -> String {
    DEFAULT_DOC_TYPE.to_string()
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            auto_close: true,
            base_cls: default_base_cls(),
            style_sheets: default_style_sheets(),
            doc_type: default_doc_type(),
            readiness: ReadinessPolicy::default(),
        }
    }
}

impl RendererConfig {
    /// Applies caller overrides on top of these defaults.
    ///
    /// Scalars are replaced; stylesheets are appended to the defaults, keeping the
    /// first occurrence of each href.
    pub fn merged(&self, overrides: &RendererOverrides) -> Self {
        let mut config = self.clone();
        if let Some(auto_close) = overrides.auto_close {
            config.auto_close = auto_close;
        }
        if let Some(base_cls) = &overrides.base_cls {
            config.base_cls = base_cls.clone();
        }
        if let Some(doc_type) = &overrides.doc_type {
            config.doc_type = doc_type.clone();
        }
        if let Some(style_sheets) = &overrides.style_sheets {
            config.style_sheets = merge_unique(&config.style_sheets, style_sheets.as_slice());
        }
        if let Some(interval_ms) = overrides.poll_interval_ms {
            config.readiness.interval_ms = interval_ms;
        }
        if let Some(max_attempts) = overrides.max_poll_attempts {
            config.readiness.max_attempts = max_attempts;
        }
        if let Some(on_timeout) = overrides.on_timeout {
            config.readiness.on_timeout = on_timeout;
        }
        config.sanitize();
        config
    }

    pub fn sanitize(&mut self) {
        self.style_sheets = merge_unique(&[], &self.style_sheets);
        if self.readiness.max_attempts == 0 {
            self.readiness.max_attempts = 1;
        }
    }
}

fn merge_unique(base: &[String], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(base.len() + extra.len());
    for href in base.iter().chain(extra) {
        let href = href.trim();
        if href.is_empty() || merged.iter().any(|existing| existing == href) {
            continue;
        }
        merged.push(href.to_string());
    }
    merged
}

/// A single stylesheet href or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleSheets {
    One(String),
    Many(Vec<String>),
}

impl StyleSheets {
    pub fn as_slice(&self) -> &[String] {
        match self {
            StyleSheets::One(href) => std::slice::from_ref(href),
            StyleSheets::Many(hrefs) => hrefs,
        }
    }
}

impl From<&str> for StyleSheets {
    fn from(value: &str) -> Self {
        StyleSheets::One(value.to_string())
    }
}

impl From<Vec<String>> for StyleSheets {
    fn from(value: Vec<String>) -> Self {
        StyleSheets::Many(value)
    }
}

/// Caller-supplied configuration for a single print call.
/// 呼叫端為單次列印提供的設定覆寫。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererOverrides {
    #[serde(default)]
    pub auto_close: Option<bool>,
    #[serde(default)]
    pub base_cls: Option<String>,
    #[serde(default)]
    pub style_sheets: Option<StyleSheets>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
    #[serde(default)]
    pub on_timeout: Option<TimeoutFallback>,
}

impl RendererOverrides {
    pub fn auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = Some(auto_close);
        self
    }

    pub fn style_sheets(mut self, style_sheets: impl Into<StyleSheets>) -> Self {
        self.style_sheets = Some(style_sheets.into());
        self
    }

    pub fn base_cls(mut self, base_cls: impl Into<String>) -> Self {
        self.base_cls = Some(base_cls.into());
        self
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: RendererOverrides) -> Self {
        Self {
            auto_close: self.auto_close.or(fallback.auto_close),
            base_cls: self.base_cls.or(fallback.base_cls),
            style_sheets: match (self.style_sheets, fallback.style_sheets) {
                (Some(mine), Some(theirs)) => Some(StyleSheets::Many(merge_unique(
                    theirs.as_slice(),
                    mine.as_slice(),
                ))),
                (mine, theirs) => mine.or(theirs),
            },
            doc_type: self.doc_type.or(fallback.doc_type),
            poll_interval_ms: self.poll_interval_ms.or(fallback.poll_interval_ms),
            max_poll_attempts: self.max_poll_attempts.or(fallback.max_poll_attempts),
            on_timeout: self.on_timeout.or(fallback.on_timeout),
        }
    }
}
