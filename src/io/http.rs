use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

/// Connection settings for remote archives.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub max_retry: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retry: 10,
        }
    }
}

/// Reads a remote file with HTTP Range requests, so previewing a stored
/// submission only transfers the archive's tail and central directory.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpRangeReader {
    /// Connect to `url` and learn its size.
    ///
    /// A HEAD answer with `Accept-Ranges: bytes` and a `Content-Length` is
    /// enough. Otherwise a one-byte range request must come back as
    /// `206 Partial Content` with the total in `Content-Range`.
    pub async fn new(url: String, options: &HttpOptions) -> Result<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        let size = probe_size(&client, &url).await?;
        debug!("Remote source {} is {} bytes", url, size);

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
            max_retry: options.max_retry.max(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Body bytes received so far, across all range requests.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// One ranged GET, retried on timeouts and refused connections with a
    /// linear backoff.
    async fn fetch_range(&self, first: u64, last: u64) -> Result<Vec<u8>> {
        let range = format!("bytes={}-{}", first, last);
        let mut attempt = 0;

        loop {
            let sent = self
                .client
                .get(&self.url)
                .header(RANGE, &range)
                .send()
                .await;

            let err = match sent {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    return Ok(resp.bytes().await?.to_vec());
                }
                Ok(resp) => bail!("Range {} of {} failed: {}", range, self.url, resp.status()),
                Err(e) if e.is_timeout() || e.is_connect() => e,
                Err(e) => return Err(e.into()),
            };

            attempt += 1;
            if attempt >= self.max_retry {
                bail!("Giving up on range {} after {} attempts: {}", range, attempt, err);
            }
            warn!("Fetching {} failed ({}/{}): {}", range, attempt, self.max_retry, err);
            tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
        }
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let wanted = buf.len().min((self.size - offset) as usize);
        let last = offset + wanted as u64 - 1;
        let mut filled = 0;

        // Servers may answer a range with fewer bytes; ask again for the rest.
        while filled < wanted {
            let chunk = self.fetch_range(offset + filled as u64, last).await?;
            if chunk.is_empty() {
                bail!("Remote server returned an empty range at {}", offset + filled as u64);
            }
            let take = chunk.len().min(wanted - filled);
            buf[filled..filled + take].copy_from_slice(&chunk[..take]);
            filled += take;
            self.transferred_bytes
                .fetch_add(take as u64, Ordering::Relaxed);
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

async fn probe_size(client: &Client, url: &str) -> Result<u64> {
    match client.head(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            if let Some(size) = advertised_size(resp.headers()) {
                return Ok(size);
            }
            debug!("HEAD {} does not advertise byte ranges", url);
        }
        Ok(resp) => debug!("HEAD {} returned {}", url, resp.status()),
        Err(e) if e.is_timeout() || e.is_connect() => return Err(e.into()),
        Err(e) => debug!("HEAD {} failed: {}", url, e),
    }

    let resp = client.get(url).header(RANGE, "bytes=0-0").send().await?;
    match resp.status() {
        // an empty file cannot satisfy any range but still reports `*/0`
        StatusCode::PARTIAL_CONTENT | StatusCode::RANGE_NOT_SATISFIABLE => {
            range_total(resp.headers())
                .ok_or_else(|| anyhow!("Remote server did not report the size of {}", url))
        }
        status if status.is_success() => bail!("Remote server does not support Range requests"),
        status => bail!("HTTP request for {} failed with status: {}", url, status),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: reqwest::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn advertised_size(headers: &HeaderMap) -> Option<u64> {
    if !header_str(headers, ACCEPT_RANGES)?.contains("bytes") {
        return None;
    }
    header_str(headers, CONTENT_LENGTH)?.trim().parse().ok()
}

/// Total length from `Content-Range: bytes 0-0/1234` or `bytes */1234`.
fn range_total(headers: &HeaderMap) -> Option<u64> {
    let value = header_str(headers, CONTENT_RANGE)?;
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}
