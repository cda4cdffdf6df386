//! Binary-side helpers: target probing, terminal setup, progress display.

pub(crate) mod access;
pub(crate) mod progress;
pub(crate) mod terminal;
