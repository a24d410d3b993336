//! URL view used by the policy engine
//!
//! Parsing is delegated to the `url` crate. This module only exposes the
//! three pieces every decision needs: scheme, host and path.

use thiserror::Error;

/// Scheme every navigation and resource load must use.
pub const SECURE_SCHEME: &str = "https";

/// Error type for request URL inspection.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("URL has no host")]
    MissingHost,
}

/// Parsed request URL.
#[derive(Debug, Clone)]
pub struct RequestUrl {
    inner: url::Url,
}

impl RequestUrl {
    /// Parse an absolute URL.
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let inner = url::Url::parse(input.trim())?;
        Ok(Self { inner })
    }

    /// Lowercase scheme without the trailing `:`.
    #[inline]
    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    #[inline]
    pub fn is_https(&self) -> bool {
        self.scheme() == SECURE_SCHEME
    }

    /// Hostname, lowercased by the parser for special schemes.
    ///
    /// Returns `None` for URLs without an authority (`data:`, `about:`) and for
    /// an empty host.
    #[inline]
    pub fn host(&self) -> Option<&str> {
        self.inner.host_str().filter(|h| !h.is_empty())
    }

    /// Like [`host`](Self::host) but reports the missing host as an error.
    pub fn require_host(&self) -> Result<&str, UrlError> {
        self.host().ok_or(UrlError::MissingHost)
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.inner.path()
    }
}
