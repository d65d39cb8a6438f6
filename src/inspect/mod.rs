//! Archive inspection: listings for the tree builder and single-file
//! previews.
//!
//! Sources are either a stored file or an HTTP URL that supports Range
//! requests. Only ZIP contents are decoded; RAR archives and anything else
//! produce an empty listing, which callers report as "empty or unsupported
//! format". Real failures come back as [`PreviewError`].

pub mod text;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::error::{PreviewError, Result};
use crate::io::{HttpOptions, HttpRangeReader, LocalFileReader, ReadAt};
use crate::tree::ArchiveEntry;
use crate::zip::ZipReader;

/// Default cap on preview bytes, matching the portal's 1 MB limit.
pub const DEFAULT_MAX_PREVIEW_BYTES: usize = 1_000_000;

/// Default cap on Central Directory entries.
pub const DEFAULT_MAX_ENTRIES: u64 = 100_000;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";

/// Limits applied to every inspection.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub max_preview_bytes: usize,
    pub max_entries: u64,
    pub http: HttpOptions,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            max_preview_bytes: DEFAULT_MAX_PREVIEW_BYTES,
            max_entries: DEFAULT_MAX_ENTRIES,
            http: HttpOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
    Other,
}

impl ArchiveKind {
    /// Decide by magic bytes first, falling back to the file extension.
    pub fn detect(name: &str, magic: &[u8]) -> Self {
        if magic.starts_with(ZIP_MAGIC) || magic.starts_with(ZIP_EMPTY_MAGIC) {
            return ArchiveKind::Zip;
        }
        if magic.starts_with(RAR_MAGIC) {
            return ArchiveKind::Rar;
        }

        let lower = name.to_lowercase();
        if lower.ends_with(".zip") {
            ArchiveKind::Zip
        } else if lower.ends_with(".rar") {
            ArchiveKind::Rar
        } else {
            ArchiveKind::Other
        }
    }
}

/// Where an archive or file is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(String),
}

impl Source {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            Source::Remote(input.to_string())
        } else {
            Source::Local(PathBuf::from(input))
        }
    }

    /// Last path component, used for extension checks and display.
    pub fn file_name(&self) -> String {
        match self {
            Source::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            Source::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().unwrap_or(path).to_string()
            }
        }
    }
}

/// Listing of an archive's entries, unsorted, as the archive stores them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveContent {
    pub files: Vec<ArchiveEntry>,
}

/// Textual preview of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePreview {
    pub filename: String,
    pub content: Option<String>,
    pub is_text: bool,
    pub size: u64,
    #[serde(default)]
    pub truncated: bool,
}

impl FilePreview {
    /// Classify `excerpt` (the first bytes of a file of `size` bytes).
    pub fn from_excerpt(filename: String, excerpt: &[u8], size: u64, limit: usize) -> Self {
        let is_text = text::has_text_extension(&filename) || text::looks_like_text(excerpt);
        let content = is_text.then(|| text::decode_excerpt(excerpt));
        Self {
            filename,
            content,
            is_text,
            size,
            truncated: is_text && size > limit as u64,
        }
    }
}

/// Runs listings and previews under one set of limits.
pub struct Inspector {
    options: InspectOptions,
}

impl Inspector {
    pub fn new(options: InspectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InspectOptions {
        &self.options
    }

    /// List the entries of an archive.
    pub async fn preview(&self, source: &Source) -> Result<ArchiveContent> {
        let name = source.file_name();
        match source {
            Source::Local(path) => {
                let reader = Arc::new(open_local(path)?);
                self.preview_reader(&name, reader).await
            }
            Source::Remote(url) => {
                let reader = Arc::new(self.open_remote(url).await?);
                let content = self.preview_reader(&name, reader.clone()).await;
                info!("Fetched {} bytes from {}", reader.transferred_bytes(), reader.url());
                content
            }
        }
    }

    /// List the entries of an archive held by any reader.
    pub async fn preview_reader<R: ReadAt + 'static>(
        &self,
        name: &str,
        reader: Arc<R>,
    ) -> Result<ArchiveContent> {
        match sniff(name, reader.as_ref()).await? {
            ArchiveKind::Zip => {
                let zip = ZipReader::new(reader, self.options.max_entries);
                let files = zip.entries().await.map_err(PreviewError::Archive)?;
                debug!("{} lists {} entries", name, files.len());
                Ok(ArchiveContent { files })
            }
            kind => {
                warn!("{} is not a readable archive ({:?}), listing nothing", name, kind);
                Ok(ArchiveContent::default())
            }
        }
    }

    /// Preview a file in local storage.
    pub async fn preview_file(&self, path: &Path) -> Result<FilePreview> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PreviewError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Err(PreviewError::IsDirectory(path.display().to_string()));
        }

        let limit = self.options.max_preview_bytes;
        let file = tokio::fs::File::open(path).await?;
        let mut excerpt = Vec::with_capacity(limit.min(metadata.len() as usize));
        file.take(limit as u64).read_to_end(&mut excerpt).await?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(FilePreview::from_excerpt(
            filename,
            &excerpt,
            metadata.len(),
            limit,
        ))
    }

    /// Preview one entry inside an archive.
    pub async fn preview_entry(&self, source: &Source, entry: &str) -> Result<FilePreview> {
        let name = source.file_name();
        match source {
            Source::Local(path) => {
                let reader = Arc::new(open_local(path)?);
                self.preview_entry_reader(&name, reader, entry).await
            }
            Source::Remote(url) => {
                let reader = Arc::new(self.open_remote(url).await?);
                self.preview_entry_reader(&name, reader, entry).await
            }
        }
    }

    pub async fn preview_entry_reader<R: ReadAt + 'static>(
        &self,
        name: &str,
        reader: Arc<R>,
        entry: &str,
    ) -> Result<FilePreview> {
        match sniff(name, reader.as_ref()).await? {
            ArchiveKind::Zip => {}
            ArchiveKind::Rar => return Err(PreviewError::Unsupported(format!("{} (RAR)", name))),
            ArchiveKind::Other => return Err(PreviewError::Unsupported(name.to_string())),
        }

        let zip = ZipReader::new(reader, self.options.max_entries);
        let found = zip
            .find(entry)
            .await
            .map_err(PreviewError::Archive)?
            .ok_or_else(|| PreviewError::EntryNotFound(entry.to_string()))?;
        if found.is_directory {
            return Err(PreviewError::IsDirectory(found.file_name));
        }

        let limit = self.options.max_preview_bytes;
        let excerpt = zip
            .read_prefix(&found, limit)
            .await
            .map_err(PreviewError::Archive)?;

        let filename = found
            .file_name
            .rsplit('/')
            .next()
            .unwrap_or(&found.file_name)
            .to_string();
        Ok(FilePreview::from_excerpt(
            filename,
            &excerpt,
            found.uncompressed_size,
            limit,
        ))
    }

    async fn open_remote(&self, url: &str) -> Result<HttpRangeReader> {
        HttpRangeReader::new(url.to_string(), &self.options.http)
            .await
            .map_err(PreviewError::Remote)
    }
}

fn open_local(path: &Path) -> Result<LocalFileReader> {
    if !path.exists() {
        return Err(PreviewError::NotFound(path.display().to_string()));
    }
    if path.is_dir() {
        return Err(PreviewError::IsDirectory(path.display().to_string()));
    }
    LocalFileReader::new(path).map_err(PreviewError::Archive)
}

async fn sniff<R: ReadAt>(name: &str, reader: &R) -> Result<ArchiveKind> {
    let mut magic = [0u8; 8];
    let n = reader
        .read_at(0, &mut magic)
        .await
        .map_err(PreviewError::Archive)?;
    Ok(ArchiveKind::detect(name, &magic[..n]))
}
