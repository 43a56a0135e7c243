use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::config::{ReadinessPolicy, RendererConfig, TimeoutFallback};
use crate::document::PROBE_ELEMENT_ID;
use crate::registry::RendererId;
use crate::surface::{PrintSurface, SurfaceHost, PROBE_HIDDEN};

/// Final result of a print request. Failures are reported here, never raised.
/// 列印請求的最終結果；失敗只會記錄於此，不會拋出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    Printed {
        surface: String,
        /// Printed after the readiness poll gave up.
        forced: bool,
        /// Printed before finalising, on engines that lose the document afterwards.
        via_quirk: bool,
        closed: bool,
    },
    /// No tag in the component's chain has a registered renderer.
    NoRenderer,
    /// A tag resolved to a renderer id nobody provides a factory for.
    MissingFactory(RendererId),
    RenderFailed(String),
    /// The host refused to open the surface.
    SurfaceUnavailable { surface: String },
    /// The probe element vanished before styles applied.
    SurfaceLost { surface: String },
    /// Styles never applied within the readiness policy.
    TimedOut { surface: String },
}

impl PrintOutcome {
    pub fn is_printed(&self) -> bool {
        matches!(self, PrintOutcome::Printed { .. })
    }

    /// Name of the surface involved, if one was addressed.
    pub fn surface(&self) -> Option<&str> {
        match self {
            PrintOutcome::Printed { surface, .. }
            | PrintOutcome::SurfaceUnavailable { surface }
            | PrintOutcome::SurfaceLost { surface }
            | PrintOutcome::TimedOut { surface } => Some(surface),
            PrintOutcome::NoRenderer
            | PrintOutcome::MissingFactory(_)
            | PrintOutcome::RenderFailed(_) => None,
        }
    }
}

/// Defers the next readiness check.
pub trait Scheduler: Send + Sync {
    fn defer(&self, delay: Duration);
}

/// Blocks the calling thread for the requested delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn defer(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Runs the next check right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn defer(&self, _delay: Duration) {}
}

/// Result of a single readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Pending,
    Done(PrintOutcome),
}

/// Open → write → finalise → poll → print → close, for one surface.
/// 單一輸出目標的列印生命週期。
#[derive(Debug)]
pub struct PrintCycle<S: PrintSurface> {
    name: String,
    surface: Option<S>,
    auto_close: bool,
    policy: ReadinessPolicy,
    attempts: u32,
    finished: Option<PrintOutcome>,
}

impl<S: PrintSurface> PrintCycle<S> {
    /// Opens the surface and writes `document` into it.
    ///
    /// On engines that lose the document once finalised, printing happens here
    /// and the cycle is already finished.
    pub fn begin<H>(host: &H, name: &str, document: &str, config: &RendererConfig) -> Self
    where
        H: SurfaceHost<Surface = S>,
    {
        let mut cycle = Self {
            name: name.to_string(),
            surface: None,
            auto_close: config.auto_close,
            policy: config.readiness,
            attempts: 0,
            finished: None,
        };

        let Some(mut surface) = host.open(name) else {
            warn!("surface '{name}' could not be opened; print dropped");
            cycle.finished = Some(PrintOutcome::SurfaceUnavailable {
                surface: cycle.name.clone(),
            });
            return cycle;
        };

        surface.write(document);
        let quirk = surface.loses_document_on_finalize();
        cycle.surface = Some(surface);
        if quirk {
            debug!("surface '{name}' prints before finalising");
            cycle.print_now(false, true);
        } else {
            if let Some(surface) = cycle.surface.as_mut() {
                surface.finalize();
            }
            debug!("surface '{name}' written; waiting for stylesheets");
        }
        cycle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn outcome(&self) -> Option<&PrintOutcome> {
        self.finished.as_ref()
    }

    /// Checks the probe once. Prints on the first check that sees it hidden.
    pub fn tick(&mut self) -> Tick {
        if let Some(outcome) = &self.finished {
            return Tick::Done(outcome.clone());
        }
        let display = match self.surface.as_ref() {
            Some(surface) => surface.probe_display(PROBE_ELEMENT_ID),
            None => None,
        };

        match display {
            None => {
                warn!("surface '{}' lost before stylesheets applied", self.name);
                self.finish(PrintOutcome::SurfaceLost {
                    surface: self.name.clone(),
                });
            }
            Some(display) if display == PROBE_HIDDEN => self.print_now(false, false),
            Some(display) => {
                self.attempts += 1;
                trace!(
                    "surface '{}' probe display '{display}' (attempt {}/{})",
                    self.name,
                    self.attempts,
                    self.policy.max_attempts
                );
                if self.attempts >= self.policy.max_attempts {
                    match self.policy.on_timeout {
                        TimeoutFallback::Abort => {
                            warn!(
                                "stylesheets for '{}' not applied after {} checks; print dropped",
                                self.name, self.attempts
                            );
                            self.finish(PrintOutcome::TimedOut {
                                surface: self.name.clone(),
                            });
                        }
                        TimeoutFallback::PrintAnyway => {
                            warn!(
                                "stylesheets for '{}' not applied after {} checks; printing anyway",
                                self.name, self.attempts
                            );
                            self.print_now(true, false);
                        }
                    }
                }
            }
        }

        match &self.finished {
            Some(outcome) => Tick::Done(outcome.clone()),
            None => Tick::Pending,
        }
    }

    /// Ticks until the cycle finishes, deferring by the poll interval before each check.
    pub fn run(&mut self, scheduler: &dyn Scheduler) -> PrintOutcome {
        loop {
            if let Some(outcome) = &self.finished {
                return outcome.clone();
            }
            scheduler.defer(self.policy.interval());
            if let Tick::Done(outcome) = self.tick() {
                return outcome;
            }
        }
    }

    fn print_now(&mut self, forced: bool, via_quirk: bool) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.print();
        if self.auto_close {
            surface.close();
        }
        debug!("surface '{}' printed (closed: {})", self.name, self.auto_close);
        self.finish(PrintOutcome::Printed {
            surface: self.name.clone(),
            forced,
            via_quirk,
            closed: self.auto_close,
        });
    }

    fn finish(&mut self, outcome: PrintOutcome) {
        self.finished = Some(outcome);
    }
}
