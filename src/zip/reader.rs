use flate2::read::DeflateDecoder;
use log::debug;
use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use crate::tree::ArchiveEntry;
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Extra compressed bytes fetched beyond the output limit. Deflate's stored
/// blocks add five bytes per 64 KiB, so this always covers `limit` output
/// bytes of incompressible data.
const INFLATE_SLACK: u64 = 64 * 1024;

/// Lists a ZIP and reads bounded prefixes of its entries.
pub struct ZipReader<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipReader<R> {
    pub fn new(reader: Arc<R>, max_entries: u64) -> Self {
        Self {
            parser: ZipParser::new(reader, max_entries),
        }
    }

    /// Raw Central Directory entries, in archive order.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Entries in the shape the tree builder consumes.
    pub async fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let files = self.list_files().await?;
        Ok(files.iter().map(ZipFileEntry::to_archive_entry).collect())
    }

    /// Look an entry up by its archive path. An exact name wins; otherwise
    /// leading slashes and a trailing directory slash are ignored on both
    /// sides.
    pub async fn find(&self, name: &str) -> Result<Option<ZipFileEntry>> {
        let mut files = self.list_files().await?;
        if let Some(exact) = files.iter().position(|f| f.file_name == name) {
            return Ok(Some(files.swap_remove(exact)));
        }

        let wanted = name.trim_matches('/');
        Ok(files
            .into_iter()
            .find(|f| f.file_name.trim_matches('/') == wanted))
    }

    /// Read at most `limit` uncompressed bytes from the start of `entry`.
    ///
    /// Never inflates more than `limit` bytes and never fetches more than
    /// `limit + 64 KiB` compressed bytes, whatever sizes the header claims.
    pub async fn read_prefix(&self, entry: &ZipFileEntry, limit: usize) -> Result<Vec<u8>> {
        if entry.is_directory || limit == 0 {
            return Ok(Vec::new());
        }

        let data_offset = self.parser.data_offset(entry).await?;
        let source_size = self.parser.reader().size();
        let available = source_size.saturating_sub(data_offset);
        if entry.compressed_size > available {
            bail!(
                "Entry {} claims {} compressed bytes but only {} remain",
                entry.file_name,
                entry.compressed_size,
                available
            );
        }

        match entry.compression_method {
            CompressionMethod::Stored => {
                let len = entry.compressed_size.min(limit as u64) as usize;
                let mut buf = vec![0u8; len];
                self.parser.reader().read_exact_at(data_offset, &mut buf).await?;
                Ok(buf)
            }
            CompressionMethod::Deflate => {
                let to_fetch = entry.compressed_size.min(limit as u64 + INFLATE_SLACK);
                let partial_input = to_fetch < entry.compressed_size;
                let mut raw = vec![0u8; to_fetch as usize];
                self.parser.reader().read_exact_at(data_offset, &mut raw).await?;
                inflate_prefix(&raw, limit, partial_input, &entry.file_name)
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method {} for {}",
                    method,
                    entry.file_name
                )
            }
        }
    }
}

fn inflate_prefix(raw: &[u8], limit: usize, partial_input: bool, name: &str) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(raw);
    let mut out = Vec::with_capacity(limit.min(raw.len().saturating_mul(4)));
    let mut chunk = [0u8; 16 * 1024];

    while out.len() < limit {
        match decoder.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let take = n.min(limit - out.len());
                out.extend_from_slice(&chunk[..take]);
            }
            // A cut-off stream ends in an error once its input runs out.
            Err(e) if partial_input => {
                debug!("Stopped inflating {} after {} bytes: {}", name, out.len(), e);
                break;
            }
            Err(e) => bail!("Corrupt deflate stream in {}: {}", name, e),
        }
    }

    Ok(out)
}
