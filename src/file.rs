//! Config file discovery and parsing.
//!
//! [`discover`] turns the search paths into candidate files, lowest priority
//! first, and reads the ones that exist. [`parse_file`] turns one file into
//! the flat pairs the resolve pipeline layers into a store. The file
//! extension picks the parser, `.toml` or `.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::flatten::flatten;
use crate::types::{Boundary, SearchMode, SearchPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    /// Pick the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(FileFormat::Toml),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parse one file's contents into flat `(key, value)` pairs.
pub fn parse_file(path: &Path, content: &str) -> Result<Vec<(String, String)>, SourceError> {
    let pairs = match FileFormat::from_path(path)? {
        FileFormat::Toml => {
            let table: toml::Table =
                toml::from_str(content).map_err(|e| SourceError::ParseError {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            flatten(&table)?
        }
        FileFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).map_err(|e| SourceError::JsonError {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            flatten(&value)?
        }
    };
    tracing::debug!(path = %path.display(), keys = pairs.len(), "parsed config file");
    Ok(pairs)
}

/// The directories one search path stands for, lowest priority first.
///
/// `cwd` anchors [`SearchPath::Cwd`] and [`SearchPath::Ancestors`]; without
/// it those contribute nothing. Paths that cannot be resolved on this
/// platform (no home directory, say) are skipped.
pub fn directories(path: &SearchPath, app_name: &str, cwd: Option<&Path>) -> Vec<PathBuf> {
    match path {
        SearchPath::Platform => directories::ProjectDirs::from("", "", app_name)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .into_iter()
            .collect(),
        SearchPath::Home(subdir) => directories::UserDirs::new()
            .map(|user| user.home_dir().join(subdir))
            .into_iter()
            .collect(),
        SearchPath::Cwd => cwd.map(Path::to_path_buf).into_iter().collect(),
        SearchPath::Path(dir) => vec![dir.clone()],
        SearchPath::Ancestors(boundary) => cwd
            .map(|start| ancestors(start, boundary))
            .unwrap_or_default(),
    }
}

/// `start` and its parents up to `boundary`, shallowest first. A marker that
/// is never found walks all the way to the root.
fn ancestors(start: &Path, boundary: &Boundary) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for dir in start.ancestors() {
        dirs.push(dir.to_path_buf());
        if let Boundary::Marker(marker) = boundary
            && dir.join(marker).exists()
        {
            break;
        }
    }
    dirs.reverse();
    dirs
}

/// Find and read `file_name` across `search_paths`.
///
/// Returns `(path, contents)` in priority-ascending order. In
/// [`SearchMode::FirstMatch`] only the highest-priority file that exists is
/// read. Missing files are skipped; any other I/O failure is an error.
pub fn discover(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
    mode: SearchMode,
) -> Result<Vec<(PathBuf, String)>, SourceError> {
    let cwd = std::env::current_dir().ok();
    let candidates: Vec<PathBuf> = search_paths
        .iter()
        .flat_map(|path| directories(path, app_name, cwd.as_deref()))
        .map(|dir| dir.join(file_name))
        .collect();

    match mode {
        SearchMode::Merge => candidates
            .into_iter()
            .filter_map(|path| read_existing(path).transpose())
            .collect(),
        SearchMode::FirstMatch => {
            for path in candidates.into_iter().rev() {
                if let Some(found) = read_existing(path)? {
                    return Ok(vec![found]);
                }
            }
            Ok(Vec::new())
        }
    }
}

fn read_existing(path: PathBuf) -> Result<Option<(PathBuf, String)>, SourceError> {
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "found config file");
            Ok(Some((path, content)))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SourceError::IoError { path, source }),
    }
}
