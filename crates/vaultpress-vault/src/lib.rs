//! # Vault Access
//!
//! File system side of an export: reading the source note, finding the
//! assets it embeds, and writing results without leaving half-finished files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vaultpress_vault::prelude::*;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let vault = Path::new("/path/to/vault");
//!     let note = SourceDocument::load(vault, Path::new("blog/My Post.md")).await?;
//!     println!("Exporting {}", note.title());
//!
//!     let assets = AssetIndex::scan(vault, &[".obsidian".to_string()])?;
//!     if let Some(cat) = assets.find("cat.png") {
//!         let bytes = assets.read(cat).await?;
//!         println!("{} bytes", bytes.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Core Modules
//!
//! ### Source
//!
//! [`source::SourceDocument`] holds a note's text and its position in the
//! vault. Paths are checked against the vault root before reading.
//!
//! ### Assets
//!
//! [`assets::AssetIndex`] lists every non-markdown file once, honoring the
//! configured exclude patterns, and resolves embed references by path suffix.
//!
//! ### Atomic Operations
//!
//! [`atomic::AtomicFileOps`] groups writes into a transaction:
//! - Atomic writes (write-to-temp then rename)
//! - Backups taken before any file changes
//! - Rollback on failure, then the error is returned
//!
//! Example:
//! ```no_run
//! use vaultpress_vault::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let ops = AtomicFileOps::scratch()?;
//! ops.execute_transaction(vec![
//!     FileOp::write("/site/images/cat.png", b"...".to_vec()),
//!     FileOp::write("/site/_posts/2024-01-01-Post.md", "..."),
//! ])
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod atomic;
pub mod source;

pub use assets::{AssetIndex, VaultAsset};
pub use atomic::{AtomicFileOps, FileOp, TransactionResult, remove_quietly, write_atomic};
pub use source::SourceDocument;
pub use vaultpress_core::prelude::*;

pub mod prelude {
    pub use crate::assets::*;
    pub use crate::atomic::*;
    pub use crate::source::*;
    pub use vaultpress_core::prelude::*;
}
