//! Runtime-configurable settings with RON persistence.

mod error;
mod settings;

pub use error::SettingsError;
pub use settings::{Settings, SharedSettings};
