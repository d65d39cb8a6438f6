use thiserror::Error;

/// Failure to inspect an archive or file.
///
/// An archive that opens fine but has no entries is not an error; callers
/// get an empty listing for that and must keep the two cases apart.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("Entry is a directory: {0}")]
    IsDirectory(String),

    #[error("Archive format not supported for entry preview: {0}")]
    Unsupported(String),

    #[error("Corrupt or unreadable archive: {0}")]
    Archive(#[source] anyhow::Error),

    #[error("Remote source failed: {0}")]
    Remote(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PreviewError>;
