//! Read/write probe of the target directory, run before any network activity.

use std::fs;
use std::path::Path;

use tracing::debug;

const PROBE_FILE_NAME: &str = ".qcfetch-access-probe";
const PROBE_CONTENT: &[u8] = b"write test\t\n\n";

/// What the current process may do with the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathAccess {
    pub(crate) readable: bool,
    pub(crate) writable: bool,
}

impl PathAccess {
    /// A run may proceed when either access works.
    pub(crate) fn is_usable(self) -> bool {
        self.readable || self.writable
    }
}

/// Writes, reads back, and removes a probe file inside `target`.
pub(crate) fn probe_access(target: &Path) -> PathAccess {
    let probe = target.join(PROBE_FILE_NAME);
    let writable = fs::write(&probe, PROBE_CONTENT).is_ok();
    let readable = fs::read(&probe).is_ok_and(|content| content == PROBE_CONTENT);
    if writable && let Err(e) = fs::remove_file(&probe) {
        debug!(path = %probe.display(), error = %e, "could not remove access probe");
    }
    debug!(target = %target.display(), readable, writable, "target access probed");
    PathAccess { readable, writable }
}
