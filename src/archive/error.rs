//! Error types for archive access.
//!
//! Network failures, unexpected listing content and local filesystem
//! failures are kept apart so callers can decide which ones are fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the remote archive or writing its files.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Network-level error (DNS resolution, connection refused, reset, etc.)
    #[error("network error fetching {url}: {source}")]
    Fetch {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A listing href or base URL could not be turned into a URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL or href.
        url: String,
    },

    /// The fetched document did not contain what was expected.
    #[error("could not parse {what} from {url}")]
    Parse {
        /// The page that was parsed.
        url: String,
        /// What was expected in the page.
        what: &'static str,
    },

    /// The HTTP session could not be built.
    #[error("could not build HTTP session: {reason}")]
    Session {
        /// Why the builder failed.
        reason: String,
    },

    /// Local filesystem error (directory creation, write, scan).
    #[error("IO error at {path}: {source}")]
    FileSystem {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Creates a network error from a reqwest error.
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a parse error.
    pub fn parse(url: impl Into<String>, what: &'static str) -> Self {
        Self::Parse {
            url: url.into(),
            what,
        }
    }

    /// Creates a session construction error.
    pub fn session(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
        }
    }

    /// Creates a filesystem error.
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the same request may succeed later: network
    /// errors, 5xx and 429 responses, and local write failures.
    ///
    /// Any other status (404, 410, ...) is a final answer from the server.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { .. } | Self::FileSystem { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl { .. } | Self::Parse { .. } | Self::Session { .. } => false,
        }
    }
}
