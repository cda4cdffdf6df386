//! Work item type for the download queue.

use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::archive::{Category, SubCollection};

/// A single pending download: where to fetch it and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    /// Absolute URL of the remote file.
    pub url: Url,
    /// Destination path on disk.
    pub destination: PathBuf,
}

impl WorkItem {
    /// Creates a work item.
    #[must_use]
    pub fn new(url: Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            url,
            destination: destination.into(),
        }
    }

    /// Builds the destination `<base>/<sub_collection>/<category>/<filename>`.
    #[must_use]
    pub fn destination_for(
        base: &Path,
        sub_collection: &SubCollection,
        category: Category,
        filename: &str,
    ) -> PathBuf {
        category_dir(base, sub_collection, category).join(filename)
    }
}

/// Directory holding one category of one sub-collection.
#[must_use]
pub fn category_dir(base: &Path, sub_collection: &SubCollection, category: Category) -> PathBuf {
    base.join(sub_collection.id()).join(category.dir_name())
}
