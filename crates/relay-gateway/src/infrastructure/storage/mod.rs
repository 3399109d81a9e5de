//! Storage infrastructure: files read once at startup.
//!
//! - `caps_file` – the capability defaults document (JSON).
//! - `settings`  – the optional gateway settings file (TOML).
//!
//! Neither file is written back by the gateway.

pub mod caps_file;
pub mod settings;

pub use caps_file::{load_capabilities, StoreError};
pub use settings::{load_settings, RelaySettings, SettingsError};
