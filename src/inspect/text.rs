//! Text detection and excerpt decoding for previews.

/// Extensions the portal always treats as text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "html", "css", "js", "ts", "tsx", "jsx", "json", "xml", "md", "py", "rs", "c", "cpp",
    "h", "java", "php", "sql", "sh", "bat", "yml", "yaml", "toml", "ini", "cfg", "log",
];

pub fn has_text_extension(name: &str) -> bool {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Content sniff for files whose extension says nothing.
///
/// A NUL byte means binary. Otherwise the bytes must be UTF-8, except for
/// a multi-byte character cut off by the excerpt limit.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return false;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Decode an excerpt, dropping a trailing partial character.
pub fn decode_excerpt(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
