//! Remote-versus-local set difference for one sub-collection.

use std::collections::BTreeMap;

use tracing::debug;

use crate::archive::{Category, RemoteFileRef, RemoteListing};
use crate::local::LocalFileSet;

/// Drops every remote ref whose local filename is already present.
///
/// Surviving refs keep the order of the remote listing. Refs without a
/// derivable local filename cannot be placed on disk and are dropped too.
/// A category missing from `local_files` counts as having no local files.
#[must_use]
pub fn reconcile(
    remote_refs: &RemoteListing,
    local_files: &LocalFileSet,
) -> BTreeMap<Category, Vec<RemoteFileRef>> {
    remote_refs
        .iter()
        .map(|(&category, refs)| {
            let present = local_files.get(&category);
            let missing: Vec<RemoteFileRef> = refs
                .iter()
                .filter(|file_ref| match file_ref.local_filename() {
                    Some(name) => present.is_none_or(|names| !names.contains(&name)),
                    None => {
                        debug!(href = file_ref.href(), "no local filename, skipping");
                        false
                    }
                })
                .cloned()
                .collect();
            (category, missing)
        })
        .collect()
}
