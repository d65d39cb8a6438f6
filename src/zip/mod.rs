//! ZIP listing and bounded entry reads.
//!
//! - [`structures`]: EOCD, ZIP64 and header layouts
//! - [`parser`]: Central Directory parsing from a [`ReadAt`](crate::io::ReadAt) source
//! - [`reader`]: entry listing and size-capped reads of single entries
//!
//! Only the archive tail and the Central Directory are read to list a ZIP.
//! STORED and DEFLATE entries can be previewed; encryption, multi-disk
//! archives and other compression methods are not supported.

mod parser;
mod reader;
mod structures;

pub use parser::ZipParser;
pub use reader::ZipReader;
pub use structures::*;
