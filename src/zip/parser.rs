//! Central Directory parsing.
//!
//! A ZIP is read from its end: the EOCD record (and the ZIP64 record if
//! any field is saturated) gives the Central Directory location, and the
//! Central Directory alone is enough to list every entry. Entry data is
//! only touched when a single file is previewed.

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: u64 = 65535;

/// Reads ZIP structures from any [`ReadAt`] source.
///
/// ```ignore
/// let parser = ZipParser::new(reader, 100_000);
/// let entries = parser.list_files().await?;
/// ```
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
    max_entries: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// `max_entries` caps how many headers a Central Directory may claim
    /// before anything is allocated for it.
    pub fn new(reader: Arc<R>, max_entries: u64) -> Self {
        let size = reader.size();
        Self {
            reader,
            size,
            max_entries,
        }
    }

    /// Find the End of Central Directory record and its offset.
    ///
    /// Tries the comment-less position first, then scans backwards through
    /// the largest region a comment could occupy.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            bail!("Not a valid ZIP file: {} bytes is too short", self.size);
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;
        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            // The comment must run exactly to the end of the file.
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Follow the ZIP64 locator that precedes the EOCD at `eocd_offset`.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EndOfCentralDirectory> {
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64Locator::SIZE as u64) else {
            bail!("Invalid ZIP64 format: no room for locator");
        };
        let mut locator_buf = vec![0u8; Zip64Locator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;
        let locator = Zip64Locator::from_bytes(&locator_buf)?;

        let mut record_buf = vec![0u8; Zip64EndOfCentralDirectory::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut record_buf)
            .await?;
        Zip64EndOfCentralDirectory::from_bytes(&record_buf)
    }

    /// Locate and sanity-check the Central Directory.
    pub async fn central_directory(&self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd().await?;
        let cd = if eocd.is_zip64() {
            self.read_zip64_eocd(eocd_offset).await?.central_directory()
        } else {
            eocd.central_directory()
        };

        if cd.offset.checked_add(cd.size).is_none_or(|end| end > self.size) {
            bail!(
                "Central Directory ({} bytes at {}) lies outside a {} byte archive",
                cd.size,
                cd.offset,
                self.size
            );
        }
        if cd.entries > self.max_entries {
            bail!(
                "Archive lists {} entries, more than the limit of {}",
                cd.entries,
                self.max_entries
            );
        }
        if cd.entries.saturating_mul(CDFH_MIN_SIZE as u64) > cd.size {
            bail!(
                "Central Directory of {} bytes cannot hold {} entries",
                cd.size,
                cd.entries
            );
        }

        Ok(cd)
    }

    /// List every entry from the Central Directory.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let cd = self.central_directory().await?;
        debug!(
            "Central Directory: {} entries, {} bytes at offset {}",
            cd.entries, cd.size, cd.offset
        );

        // One read for the whole directory, a single Range request over HTTP
        let mut cd_data = vec![0u8; cd.size as usize];
        self.reader.read_exact_at(cd.offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(cd.entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for _ in 0..cd.entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset of an entry's data, past its Local File Header.
    ///
    /// The local name and extra field lengths can differ from the Central
    /// Directory copy, so they are read from the local header itself.
    pub async fn data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf).await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// Parse one Central Directory File Header.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    // versions made by / needed, flags
    cursor.set_position(cursor.position() + 6);
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    // mod time, mod date, crc32
    cursor.set_position(cursor.position() + 8);
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    // disk number start, internal and external attributes
    cursor.set_position(cursor.position() + 8);
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/');

    let extra_start = cursor.position();
    let extra_end = extra_start + extra_field_length as u64;
    if extra_end > cursor.get_ref().len() as u64 {
        bail!("Extra field of {} runs past the Central Directory", file_name);
    }

    while cursor.position() + 4 <= extra_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = (cursor.position() + field_size).min(extra_end);

        if header_id == ZIP64_EXTRA_ID {
            // Only the saturated header fields are present, in this order.
            if uncompressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_end + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from(compression_method),
        compressed_size,
        uncompressed_size,
        lfh_offset,
        is_directory,
    })
}
