use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use log::{debug, info};
use uxprinter_printing::config::{
    DEFAULT_BASE_CLS, DEFAULT_DOC_TYPE, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_STYLE_SHEET,
};
use uxprinter_printing::{RendererOverrides, StyleSheets, TimeoutFallback};

const SETTINGS_VERSION: u32 = 1;
const MAX_POLL_INTERVAL_MS: u64 = 1_000;
const MAX_POLL_ATTEMPTS: u32 = 100_000;

/// Failures reading or persisting the printer settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read printer settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("printer settings in {path} are malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode printer settings for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot store printer settings at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot create settings directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persisted printer defaults, applied beneath per-call overrides.
/// 已儲存的列印預設值，套用於每次呼叫的覆寫之下。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSettings {
    #[serde(default)]
    pub version: u32,
    #[serde(default = "default_true")]
    pub auto_close: bool,
    #[serde(default = "default_base_cls")]
    pub base_cls: String,
    #[serde(default = "default_style_sheets")]
    pub style_sheets: Vec<String>,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default)]
    pub on_timeout: TimeoutFallback,
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

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_poll_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            auto_close: true,
            base_cls: default_base_cls(),
            style_sheets: default_style_sheets(),
            doc_type: default_doc_type(),
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            on_timeout: TimeoutFallback::default(),
        }
    }
}

impl PrinterSettings {
    pub fn sanitize(&mut self) {
        if self.base_cls.trim().is_empty() {
            self.base_cls = default_base_cls();
        }
        if self.doc_type.trim().is_empty() {
            self.doc_type = default_doc_type();
        }
        let mut style_sheets: Vec<String> = Vec::with_capacity(self.style_sheets.len());
        for href in self.style_sheets.iter().map(|href| href.trim()) {
            if !href.is_empty() && !style_sheets.iter().any(|seen| seen == href) {
                style_sheets.push(href.to_string());
            }
        }
        self.style_sheets = style_sheets;
        self.poll_interval_ms = self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS);
        self.max_poll_attempts = self.max_poll_attempts.clamp(1, MAX_POLL_ATTEMPTS);
    }

    /// Files written before versioning carry no `version`; they share the current layout.
    fn migrate(&mut self) -> bool {
        if self.version >= SETTINGS_VERSION {
            return false;
        }
        self.version = SETTINGS_VERSION;
        true
    }

    /// Folds `overrides` into the stored defaults. Stylesheets accumulate.
    pub fn apply(&mut self, overrides: &RendererOverrides) {
        if let Some(auto_close) = overrides.auto_close {
            self.auto_close = auto_close;
        }
        if let Some(base_cls) = &overrides.base_cls {
            self.base_cls = base_cls.clone();
        }
        if let Some(style_sheets) = &overrides.style_sheets {
            self.style_sheets.extend(style_sheets.as_slice().iter().cloned());
        }
        if let Some(doc_type) = &overrides.doc_type {
            self.doc_type = doc_type.clone();
        }
        if let Some(interval_ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = interval_ms;
        }
        if let Some(max_attempts) = overrides.max_poll_attempts {
            self.max_poll_attempts = max_attempts;
        }
        if let Some(on_timeout) = overrides.on_timeout {
            self.on_timeout = on_timeout;
        }
        self.sanitize();
    }

    /// Every stored value as an override, so it takes effect beneath explicit flags.
    pub fn to_overrides(&self) -> RendererOverrides {
        RendererOverrides {
            auto_close: Some(self.auto_close),
            base_cls: Some(self.base_cls.clone()),
            style_sheets: Some(StyleSheets::Many(self.style_sheets.clone())),
            doc_type: Some(self.doc_type.clone()),
            poll_interval_ms: Some(self.poll_interval_ms),
            max_poll_attempts: Some(self.max_poll_attempts),
            on_timeout: Some(self.on_timeout),
        }
    }
}

/// Printer settings bound to their JSON file.
/// 與 JSON 設定檔綁定的列印設定。
#[derive(Debug)]
pub struct PrinterSettingsStore {
    path: PathBuf,
    data: PrinterSettings,
}

impl PrinterSettingsStore {
    /// Loads settings from `path`; a missing file yields the defaults without creating it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => {
                let mut data: PrinterSettings = serde_json::from_str(&contents)
                    .map_err(|source| SettingsError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                if data.migrate() {
                    debug!("printer settings {} upgraded to v{SETTINGS_VERSION}", path.display());
                }
                data.sanitize();
                data
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no printer settings at {}; using defaults", path.display());
                PrinterSettings::default()
            }
            Err(source) => return Err(SettingsError::Read { path, source }),
        };
        Ok(Self { path, data })
    }

    pub fn settings(&self) -> &PrinterSettings {
        &self.data
    }

    /// Applies `overrides` and writes the file when anything changed.
    ///
    /// Returns whether the stored settings changed.
    pub fn update(&mut self, overrides: &RendererOverrides) -> Result<bool, SettingsError> {
        let mut next = self.data.clone();
        next.apply(overrides);
        if next == self.data && self.path.exists() {
            return Ok(false);
        }
        self.data = next;
        self.save()?;
        info!("printer settings saved to {}", self.path.display());
        Ok(true)
    }

    /// Writes the settings through a sibling temp file so readers never see a partial file.
    pub fn save(&self) -> Result<(), SettingsError> {
        let payload =
            serde_json::to_string_pretty(&self.data).map_err(|source| SettingsError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)
            .and_then(|()| fs::rename(&staging, &self.path))
            .map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
