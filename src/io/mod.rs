//! Random-access byte sources for archive inspection.
//!
//! Listing a ZIP only needs its tail and its central directory, so every
//! source is read through [`ReadAt`] rather than streamed front to back.

mod http;
mod local;
mod memory;

pub use http::{HttpOptions, HttpRangeReader};
pub use local::LocalFileReader;
pub use memory::MemoryReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely or fail.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let end = offset.saturating_add(buf.len() as u64);
        if end > self.size() {
            bail!(
                "Read past end of source: {}..{} of {} bytes",
                offset,
                end,
                self.size()
            );
        }

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                bail!("Unexpected end of source at offset {}", offset + filled as u64);
            }
            filled += n;
        }
        Ok(())
    }
}
