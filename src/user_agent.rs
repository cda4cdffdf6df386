//! User-Agent string sent to the archive.
//!
//! The archive serves plain static listings; a browser-like header keeps
//! requests indistinguishable from someone browsing the pages.

/// Browser identification header used for listings and file downloads.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.0; WOW64; rv:24.0) Gecko/20100101 Firefox/24.0";
