//! Byte sources for texture URLs.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LoadError;

/// Largest body accepted from a remote server.
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Something that can turn a URL into bytes. Called from loader threads.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// HTTP(S) fetcher backed by a blocking `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// `timeout` bounds connect and read on the socket itself, independent of
    /// the loader's per-attempt race.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => LoadError::network(url, format!("HTTP {code}")),
            ureq::Error::Transport(transport) => LoadError::network(url, transport),
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::network(url, e))?;
        tracing::debug!(url, bytes = bytes.len(), "fetched texture");
        Ok(bytes)
    }
}

/// Reads `file://` URLs and plain paths. Relative paths resolve against `root`.
/// Query strings are ignored so cache-busted URLs still find the file.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let without_scheme = url.strip_prefix("file://").unwrap_or(url);
        let without_query = without_scheme
            .split_once('?')
            .map_or(without_scheme, |(path, _)| path);
        let path = Path::new(without_query);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.resolve(url);
        std::fs::read(&path).map_err(|e| LoadError::network(url, format!("{}: {e}", path.display())))
    }
}

/// Routes `http://`/`https://` URLs to [`HttpFetcher`] and everything else to
/// [`FileFetcher`].
pub struct AssetFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl AssetFetcher {
    pub fn new(asset_root: impl Into<PathBuf>, socket_timeout: Duration) -> Self {
        Self {
            http: HttpFetcher::new(socket_timeout),
            file: FileFetcher::new(asset_root),
        }
    }
}

impl Fetcher for AssetFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url)
        } else {
            self.file.fetch(url)
        }
    }
}

/// Append `v=<version>` to `url` so a new asset revision bypasses caches.
/// An empty version leaves the URL untouched.
pub fn with_cache_buster(url: &str, version: &str) -> String {
    if version.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}v={version}")
}
