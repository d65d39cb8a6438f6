//! # contest-preview
//!
//! Archive previews and countdown reconciliation for a local coding-contest
//! portal.
//!
//! Participants upload ZIP/RAR archives and loose files; the admin views
//! them without downloading them whole, while every client follows a shared
//! countdown pushed by the portal.
//!
//! ## Features
//!
//! - List ZIP archives from local storage or over HTTP Range requests,
//!   reading only the Central Directory
//! - Turn the flat listing into a folder-first, sorted tree
//! - Bounded text previews of files on disk or inside a ZIP
//! - Extrapolate the server timer locally with one-shot threshold alerts
//!
//! ## Example
//!
//! ```no_run
//! use contest_preview::{Inspector, InspectOptions, Source, build_tree};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let inspector = Inspector::new(InspectOptions::default());
//!     let content = inspector.preview(&Source::parse("submission.zip")).await?;
//!     for node in build_tree(&content.files) {
//!         println!("{}", node.path);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod inspect;
pub mod io;
pub mod render;
pub mod timer;
pub mod tree;
pub mod zip;

pub use cli::Cli;
pub use error::PreviewError;
pub use inspect::{ArchiveContent, ArchiveKind, FilePreview, InspectOptions, Inspector, Source};
pub use io::{HttpOptions, HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use timer::{Countdown, Frame, Phase, ThresholdAlerts, TimerSnapshot};
pub use tree::{ArchiveEntry, TreeNode, build_tree};
pub use zip::{ZipFileEntry, ZipReader};
