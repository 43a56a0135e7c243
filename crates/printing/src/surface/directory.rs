use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::surface::{PrintSurface, SurfaceHost, PROBE_HIDDEN};

/// Surface host that stores every surface as `<dir>/<name>.html`.
///
/// There is no style engine behind a file, so the probe reports hidden as soon
/// as the document is finalised. Re-opening a name truncates the same file.
#[derive(Debug, Clone)]
pub struct DirectorySurfaceHost {
    dir: PathBuf,
}

impl DirectorySurfaceHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.html"))
    }
}

impl SurfaceHost for DirectorySurfaceHost {
    type Surface = DirectorySurface;

    fn open(&self, name: &str) -> Option<DirectorySurface> {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!("cannot prepare surface directory {}: {err}", self.dir.display());
            return None;
        }
        let path = self.path_for(name);
        match File::create(&path) {
            Ok(file) => {
                debug!("opened surface {}", path.display());
                Some(DirectorySurface {
                    path,
                    file: Some(file),
                    finalized: false,
                    print_count: 0,
                })
            }
            Err(err) => {
                warn!("cannot open surface {}: {err}", path.display());
                None
            }
        }
    }
}

/// One document file opened by [`DirectorySurfaceHost`].
#[derive(Debug)]
pub struct DirectorySurface {
    path: PathBuf,
    file: Option<File>,
    finalized: bool,
    print_count: u32,
}

impl DirectorySurface {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn print_count(&self) -> u32 {
        self.print_count
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

impl PrintSurface for DirectorySurface {
    fn write(&mut self, html: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = file.write_all(html.as_bytes()) {
            warn!("write to {} failed: {err}", self.path.display());
        }
    }

    fn finalize(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(err) = file.flush() {
                warn!("flush of {} failed: {err}", self.path.display());
            }
        }
        self.finalized = true;
    }

    fn probe_display(&self, _element_id: &str) -> Option<String> {
        if self.file.is_none() || !self.path.exists() {
            return None;
        }
        let display = if self.finalized { PROBE_HIDDEN } else { "block" };
        Some(display.to_string())
    }

    fn print(&mut self) {
        self.print_count += 1;
        debug!("document ready for print: {}", self.path.display());
    }

    fn close(&mut self) {
        self.file = None;
    }
}
