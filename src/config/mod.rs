//! Configuration management for sbconf-edit
//!
//! - **settings**: the tool's own settings file (search paths, log level)
//! - **discovery**: finding sing-box configuration directories
//! - **active_dir**: the shared handle on the directory being edited

pub mod active_dir;
pub mod discovery;
pub mod settings;

// Re-export commonly used types
pub use active_dir::ActiveDirectory;
pub use discovery::{discover, Discovery};
pub use settings::Settings;
