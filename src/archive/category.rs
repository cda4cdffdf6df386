//! File categories published by the archive.

use std::fmt;

use serde::Serialize;

/// Suffix shared by every primary computational log.
const PRIMARY_LOG_SUFFIX: &str = ".b3lyp_6-31g(d).log.xz";

/// Suffix shared by every compressed log (primary and time-dependent).
const LOG_SUFFIX: &str = ".log.xz";

/// Infix that marks time-dependent (excited-state) logs.
const TIME_DEPENDENT_MARKER: &str = "td";

/// Suffix of molecular structure files.
const STRUCTURE_SUFFIX: &str = ".mol";

/// One of the selectable kinds of result file.
///
/// The filename predicates are mutually exclusive: a name can match at
/// most one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Primary computational log (`<id>.b3lyp_6-31g(d).log.xz`).
    PrimaryLog,
    /// Excited-state log (`td` infix, `.log.xz`).
    TimeDependentLog,
    /// Molecular structure file (`.mol`).
    StructureFile,
}

impl Category {
    /// Every category, in a stable order.
    pub const ALL: [Category; 3] = [
        Category::PrimaryLog,
        Category::TimeDependentLog,
        Category::StructureFile,
    ];

    /// Position of this category in [`Category::ALL`].
    #[must_use]
    pub fn ordinal(self) -> usize {
        match self {
            Self::PrimaryLog => 0,
            Self::TimeDependentLog => 1,
            Self::StructureFile => 2,
        }
    }

    /// Name of the per-category directory under a sub-collection.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::PrimaryLog => "primary-log",
            Self::TimeDependentLog => "time-dependent-log",
            Self::StructureFile => "structure-file",
        }
    }

    /// Returns true when a bare filename belongs to this category.
    #[must_use]
    pub fn matches_filename(self, filename: &str) -> bool {
        let time_dependent = filename.contains(TIME_DEPENDENT_MARKER);
        match self {
            Self::PrimaryLog => filename.ends_with(PRIMARY_LOG_SUFFIX) && !time_dependent,
            Self::TimeDependentLog => filename.ends_with(LOG_SUFFIX) && time_dependent,
            Self::StructureFile => filename.ends_with(STRUCTURE_SUFFIX),
        }
    }

    /// Classifies a bare filename, if it belongs to any category.
    #[must_use]
    pub fn classify(filename: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.matches_filename(filename))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
