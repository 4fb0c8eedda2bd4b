//! Infrastructure layer - external adapters (filesystem, HTTP).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod credentials;
pub mod redmine_client;

pub use config::{config_file_path, ensure_config_exists, load_config};
pub use credentials::{clear_credentials, save_credentials};
pub use redmine_client::FileConnector;
