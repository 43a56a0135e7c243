//! Output surfaces a printed document is written into.

pub mod directory;

pub use directory::{DirectorySurface, DirectorySurfaceHost};

/// Computed `display` value that marks the probe element as styled.
pub const PROBE_HIDDEN: &str = "none";

/// A named output target (window, tab, file) holding one printable document.
/// 承載單一可列印文件的具名輸出目標（視窗、分頁、檔案）。
pub trait PrintSurface {
    /// Writes the document into the surface.
    fn write(&mut self, html: &str);

    /// Closes the document stream so the engine finishes loading it.
    fn finalize(&mut self);

    /// Computed `display` of the element with `element_id`; `None` when the
    /// element (or the whole surface) is no longer reachable.
    fn probe_display(&self, element_id: &str) -> Option<String>;

    /// Invokes native print. Usually blocks until the print dialog is dismissed.
    fn print(&mut self);

    fn close(&mut self);

    /// Engines that drop the document handle on [`finalize`](Self::finalize) but
    /// delay printing until stylesheets have loaded on their own.
    fn loses_document_on_finalize(&self) -> bool {
        false
    }
}

/// Opens named surfaces. Opening a name that is already open reuses that surface.
/// 開啟具名輸出目標；同名目標會被重複使用。
pub trait SurfaceHost {
    type Surface: PrintSurface;

    /// Returns `None` when the host refuses (popup blocked, no permission...).
    fn open(&self, name: &str) -> Option<Self::Surface>;
}

/// Everything a mock surface was asked to do, in order.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Opened(String),
    Written(String),
    Finalized,
    Probed,
    Printed,
    Closed,
}

/// In-memory implementation of [`SurfaceHost`] used for tests.
/// 測試使用的記憶體內部輸出目標實作。
#[cfg(test)]
#[derive(Clone)]
pub struct MockSurfaceHost {
    events: std::sync::Arc<std::sync::Mutex<Vec<SurfaceEvent>>>,
    probes: std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<Option<String>>>>,
    refuse: bool,
    quirk: bool,
}

#[cfg(test)]
impl Default for MockSurfaceHost {
    fn default() -> Self {
        Self {
            events: Default::default(),
            probes: Default::default(),
            refuse: false,
            quirk: false,
        }
    }
}

#[cfg(test)]
impl MockSurfaceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that refuses every surface, like a blocked popup.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Host whose surfaces lose their document when finalised.
    pub fn with_quirk() -> Self {
        Self {
            quirk: true,
            ..Self::default()
        }
    }

    /// Probe results handed out in order; `"none"` once the script runs out.
    pub fn script_probes(self, probes: &[Option<&str>]) -> Self {
        *self.probes.lock().expect("lock poisoned") =
            probes.iter().map(|probe| probe.map(str::to_string)).collect();
        self
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub fn count(&self, event: &SurfaceEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

#[cfg(test)]
pub struct MockSurface {
    events: std::sync::Arc<std::sync::Mutex<Vec<SurfaceEvent>>>,
    probes: std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<Option<String>>>>,
    quirk: bool,
}

#[cfg(test)]
impl MockSurface {
    fn record(&self, event: SurfaceEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }
}

#[cfg(test)]
impl SurfaceHost for MockSurfaceHost {
    type Surface = MockSurface;

    fn open(&self, name: &str) -> Option<MockSurface> {
        if self.refuse {
            return None;
        }
        self.events
            .lock()
            .expect("lock poisoned")
            .push(SurfaceEvent::Opened(name.to_string()));
        Some(MockSurface {
            events: self.events.clone(),
            probes: self.probes.clone(),
            quirk: self.quirk,
        })
    }
}

#[cfg(test)]
impl PrintSurface for MockSurface {
    fn write(&mut self, html: &str) {
        self.record(SurfaceEvent::Written(html.to_string()));
    }

    fn finalize(&mut self) {
        self.record(SurfaceEvent::Finalized);
    }

    fn probe_display(&self, _element_id: &str) -> Option<String> {
        self.record(SurfaceEvent::Probed);
        self.probes
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Some(PROBE_HIDDEN.to_string()))
    }

    fn print(&mut self) {
        self.record(SurfaceEvent::Printed);
    }

    fn close(&mut self) {
        self.record(SurfaceEvent::Closed);
    }

    fn loses_document_on_finalize(&self) -> bool {
        self.quirk
    }
}
