pub mod printer;

pub use printer::{PrinterSettings, PrinterSettingsStore, SettingsError};
