//! Read access to the remote archive.
//!
//! The archive publishes static HTML directory listings: a root index that
//! links one page per sub-collection, and per sub-collection pages that
//! link the result files themselves.
//!
//! - [`fetch_index`] - root page → sub-collections and molecule count
//! - [`list_remote`] - one sub-collection page → refs per [`Category`]
//! - [`ArchiveClient`] - HTTP session used by both, and by the download workers

mod category;
mod client;
mod error;
mod index;
mod listing;

pub use category::Category;
pub use client::{ArchiveClient, CONNECT_TIMEOUT_SECS, ClientSettings};
pub use error::ArchiveError;
pub use index::{ArchiveIndex, SubCollection, fetch_index, parse_index};
pub use listing::{
    RemoteFileRef, RemoteListing, list_remote, parse_listing, primary_log_refs,
    structure_file_refs, time_dependent_log_refs,
};

/// Default archive base URL.
pub const DEFAULT_BASE_URL: &str = "http://pubchemqc.riken.jp/";
