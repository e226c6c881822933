//! Where configuration files are looked for, and how the hits combine.
//!
//! Lookup has two axes. **Discovery** turns each [`SearchPath`] into one or
//! more directories, listed lowest priority first. **Resolution** decides,
//! per [`SearchMode`], whether every file found is layered or only the
//! highest-priority one is read.

use std::path::PathBuf;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit absolute path.
    Path(PathBuf),
    /// The working directory and its parents, up to `Boundary`. Deeper
    /// directories take priority.
    Ancestors(Boundary),
}

/// Where an [`Ancestors`](SearchPath::Ancestors) walk stops.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Walk to the filesystem root.
    Root,
    /// Stop at (and include) the first directory containing this entry, e.g. `".git"`.
    Marker(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Layer every file found; later directories override earlier ones.
    #[default]
    Merge,
    /// Use only the highest-priority file found.
    FirstMatch,
}
