use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{BindError, SourceError};
use crate::file;
use crate::flatten::{self, FlattenError};
use crate::resolve::{self, ResolveInput};
use crate::shape::Shape;
use crate::store::{MemoryStore, child_key};
use crate::types::{SearchMode, SearchPath};

/// Entry point for building a layered configuration store.
pub struct Confbind;

impl Confbind {
    pub fn builder() -> ConfbindBuilder {
        ConfbindBuilder::default()
    }
}

/// How the environment layer is chosen. The last builder call wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum EnvSetting {
    /// Uppercased app name.
    #[default]
    Derived,
    Prefix(String),
    Disabled,
}

/// Collects the layers of a configuration and binds types from them.
///
/// Files come from [`search_paths()`](Self::search_paths) combined per
/// [`search_mode()`](Self::search_mode). Environment variables sit on top of
/// the files, and overrides on top of both. Nothing is read until
/// [`load_store()`](Self::load_store) or [`bind()`](Self::bind).
#[derive(Debug, Default)]
pub struct ConfbindBuilder {
    app_name: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    env: EnvSetting,
    overrides: Vec<(String, String)>,
    deferred: Option<FlattenError>,
}

/// Everything the builder settings resolve to before any I/O happens.
#[derive(Debug, PartialEq)]
struct Plan {
    app_name: String,
    file_name: String,
    search_paths: Vec<SearchPath>,
    env_prefix: Option<String>,
}

impl ConfbindBuilder {
    /// Name the application. Unless set explicitly, the file name becomes
    /// `{app_name}.toml`, files are searched in the platform config directory,
    /// and environment variables are read under the uppercased name.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// The config file to look for. The extension picks the parser.
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Search these paths instead of the default `[Platform]`, last entry
    /// highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Add one path above the ones already configured (or above the default).
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Read environment variables under `prefix` instead of the app name.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env = EnvSetting::Prefix(prefix.to_string());
        self
    }

    /// Skip the environment layer.
    pub fn no_env(mut self) -> Self {
        self.env = EnvSetting::Disabled;
        self
    }

    /// Override one key. A `None` value leaves the key alone, so optional
    /// CLI arguments can be passed straight through.
    pub fn set<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.overrides.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Override every key `source` serializes to, flattened the way files
    /// are. Later overrides win over earlier ones.
    pub fn overrides_from<S: Serialize>(self, source: &S) -> Self {
        self.overrides_at("", source)
    }

    /// [`overrides_from`](Self::overrides_from) below `section`.
    ///
    /// A value that cannot be flattened is reported by the terminal call.
    pub fn overrides_at<S: Serialize>(mut self, section: &str, source: &S) -> Self {
        match flatten::flatten(source) {
            Ok(pairs) => {
                let keyed = pairs
                    .into_iter()
                    .map(|(key, value)| (child_key(section, &key), value));
                self.overrides.extend(keyed);
            }
            Err(e) if self.deferred.is_none() => self.deferred = Some(e),
            Err(_) => {}
        }
        self
    }

    fn plan(&self) -> Result<Plan, SourceError> {
        let app_name = self.app_name.clone().ok_or(SourceError::AppNameRequired)?;
        let file_name = self
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{app_name}.toml"));
        let search_paths = self
            .search_paths
            .clone()
            .unwrap_or_else(|| vec![SearchPath::Platform]);
        let env_prefix = match &self.env {
            EnvSetting::Derived => Some(app_name.to_uppercase()),
            EnvSetting::Prefix(prefix) => Some(prefix.clone()),
            EnvSetting::Disabled => None,
        };
        Ok(Plan {
            app_name,
            file_name,
            search_paths,
            env_prefix,
        })
    }

    fn into_input(mut self) -> Result<ResolveInput, SourceError> {
        if let Some(e) = self.deferred.take() {
            return Err(e.into());
        }
        let plan = self.plan()?;
        let files: Vec<(PathBuf, String)> = file::discover(
            &plan.search_paths,
            &plan.file_name,
            &plan.app_name,
            self.search_mode,
        )?;
        let env_vars = match plan.env_prefix {
            Some(_) => unicode_vars(std::env::vars_os()),
            None => Vec::new(),
        };
        tracing::debug!(
            app = %plan.app_name,
            files = files.len(),
            overrides = self.overrides.len(),
            "gathered configuration layers"
        );
        Ok(ResolveInput {
            files,
            env_vars,
            env_prefix: plan.env_prefix,
            overrides: self.overrides,
        })
    }

    /// Read every layer into one store.
    pub fn load_store(self) -> Result<MemoryStore, SourceError> {
        resolve::resolve(self.into_input()?)
    }

    /// Read every layer and bind `T` from `section`, or from the section
    /// named after the type.
    pub fn bind<T: Shape>(self, section: Option<&str>) -> Result<T, BindError> {
        let store = self.load_store()?;
        crate::bind(&store, section)
    }
}

/// Environment pairs that are valid Unicode. Others cannot name a config
/// key and are skipped.
fn unicode_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Vec<(String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
