// src/config/mod.rs

//! Settings loading and validation.
//!
//! - `types.rs`: the deployment profile enum.
//! - `model.rs`: raw (layerable) and validated settings.
//! - `loader.rs`: profile defaults, TOML file, `PROCRUNNER_*` overrides.
//! - `validate.rs`: `RawSettings` → `Settings`.

pub mod loader;
pub mod model;
pub mod types;
pub mod validate;

pub use loader::{default_settings_path, load_from_path, load_settings, load_with_env};
pub use model::{QueueSettings, RawQueueSection, RawSettings, Settings};
pub use types::Environment;
