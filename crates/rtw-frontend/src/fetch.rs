//! Scene acquisition
//!
//! Scene descriptors are fetched with a plain GET. Native builds use `ureq`
//! for http(s) and read anything else from disk; the browser build uses
//! `window.fetch` (see [`crate::web`]).

use std::future::Future;

/// Errors while fetching a scene document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Unsupported scene source: {0}")]
    UnsupportedScheme(String),
}

/// Retrieves scene documents by URL
pub trait SceneFetcher {
    /// Fetch the body of `url` as text
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeSceneFetcher;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::{Path, PathBuf};

    use super::{FetchError, SceneFetcher};

    /// http(s) through `ureq`, everything else from the filesystem
    ///
    /// Relative paths resolve against `base_dir`, mirroring how a page
    /// resolves relative scene URLs against its own location.
    #[derive(Clone)]
    pub struct NativeSceneFetcher {
        base_dir: PathBuf,
        agent: ureq::Agent,
    }

    impl NativeSceneFetcher {
        pub fn new(base_dir: impl Into<PathBuf>) -> Self {
            Self {
                base_dir: base_dir.into(),
                agent: ureq::Agent::new_with_defaults(),
            }
        }

        /// Directory relative scene paths resolve against
        pub fn base_dir(&self) -> &Path {
            &self.base_dir
        }

        fn fetch_http(&self, url: &str) -> Result<String, FetchError> {
            let mut response = self.agent.get(url).call().map_err(|e| match e {
                ureq::Error::StatusCode(status) => FetchError::Status {
                    url: url.to_string(),
                    status,
                },
                other => FetchError::Network {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;

            response
                .body_mut()
                .read_to_string()
                .map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
        }

        fn fetch_file(&self, path: &str) -> Result<String, FetchError> {
            let path = self.base_dir.join(path);
            std::fs::read_to_string(&path).map_err(|e| FetchError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    }

    impl SceneFetcher for NativeSceneFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            tracing::debug!("Fetching scene {}", url);
            if url.starts_with("http://") || url.starts_with("https://") {
                self.fetch_http(url)
            } else if let Some(path) = url.strip_prefix("file://") {
                self.fetch_file(path)
            } else if url.contains("://") {
                Err(FetchError::UnsupportedScheme(url.to_string()))
            } else {
                self.fetch_file(url)
            }
        }
    }

}
