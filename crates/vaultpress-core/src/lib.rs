//! # vaultpress Core
//!
//! Core data models, error types, and configuration shared by every vaultpress crate.
//!
//! ## Architecture Principles
//!
//! - **Explicit configuration**: an [`ExportConfig`] value is handed to each component's
//!   constructor; nothing reads ambient settings
//! - **Type-Driven Design**: front matter values are a [`FrontMatterValue`] enum, not loose strings
//! - **Zero Panic in Libraries**: all fallible operations return [`Result<T>`]
//!
//! ## Core Modules
//!
//! - [`models`] - Front matter mapping and reserved keys
//! - [`error`] - Error taxonomy and Result alias
//! - [`config`] - Export configuration, builder, and persistence
//! - [`utils`] - Path helpers
//!
//! ## Usage Examples
//!
//! ### Front Matter
//!
//! ```
//! use vaultpress_core::prelude::*;
//!
//! let mut fm = FrontMatter::new();
//! fm.set("title", "Hello World");
//! fm.set("tags", vec!["rust".to_string(), "blog".to_string()]);
//!
//! assert_eq!(fm.get_str("title"), Some("Hello World"));
//! assert_eq!(fm.tags(), vec!["rust", "blog"]);
//! ```
//!
//! ### Error Handling
//!
//! ```
//! use vaultpress_core::prelude::*;
//!
//! fn check(fm_text: &str) -> Result<()> {
//!     if !fm_text.starts_with("---") {
//!         return Err(Error::malformed_front_matter("missing opening delimiter"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check("title: nope").is_err());
//! ```
//!
//! ### Configuration
//!
//! ```
//! use vaultpress_core::prelude::*;
//!
//! let config = ExportConfig::default();
//! assert_eq!(config.image_folder, "assets/images");
//! assert!(!config.tag_service.enabled);
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use config::*;
pub use error::{Error, Result};
pub use models::*;
pub use utils::{PathValidator, expand_path};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ExportConfig, TagServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::models::{FrontMatter, FrontMatterValue, keys};
    pub use crate::utils::{PathValidator, expand_path};
}
