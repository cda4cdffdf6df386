//! Local on-disk state of a sub-collection.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

use crate::archive::Category;

/// Filenames already present locally, per category.
pub type LocalFileSet = BTreeMap<Category, HashSet<String>>;

/// Walks `base_dir` and records the bare names of files belonging to the
/// requested categories.
///
/// Every requested category gets an entry. A missing `base_dir` yields empty
/// sets; unreadable entries are skipped.
#[instrument(skip(categories), fields(base_dir = %base_dir.display()))]
#[must_use]
pub fn scan_local(base_dir: &Path, categories: &[Category]) -> LocalFileSet {
    let mut found: LocalFileSet = categories
        .iter()
        .map(|&category| (category, HashSet::new()))
        .collect();

    if !base_dir.exists() {
        debug!("local directory absent, nothing present yet");
        return found;
    }

    for entry in WalkDir::new(base_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(category) = Category::classify(name)
            && let Some(names) = found.get_mut(&category)
        {
            trace!(%category, name, "found local file");
            names.insert(name.to_string());
        }
    }

    for (category, names) in &found {
        debug!(%category, local = names.len(), "scanned local files");
    }
    found
}
