//! The hierarchical key/value store the binder reads from.
//!
//! Keys are colon-delimited, case-sensitive paths (`"Parent:Child:Field"`).
//! [`MemoryStore`] is the bundled implementation; file, environment and
//! override layers all resolve into one.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::error::ConfigurationBindError;
use crate::scalar;
use crate::shape::TypeDescriptor;
use crate::value::BoundValue;

/// Path separator between key segments.
pub const KEY_DELIMITER: char = ':';

/// Join a parent key and a child segment.
pub fn child_key(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}{KEY_DELIMITER}{segment}")
    }
}

/// One direct child of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    /// The last path segment, e.g. `"0"` or `"Url"`.
    pub segment: String,
    /// The full key of the child section.
    pub key: String,
}

/// Why a native bulk materialization gave up. Never surfaced from a bind.
#[derive(Debug, Error)]
pub enum BulkError {
    #[error("bulk materialization does not support element type '{0}'")]
    UnsupportedElement(String),

    #[error("'{0}' is a section, not a value")]
    NotAValue(String),

    #[error(transparent)]
    Conversion(#[from] ConfigurationBindError),
}

pub trait ConfigStore {
    /// Whether `key` holds a value or has any children.
    fn exists(&self, key: &str) -> bool;

    fn get_scalar(&self, key: &str) -> Option<&str>;

    /// Direct children of `key`, in store order (index order for arrays).
    fn get_children(&self, key: &str) -> Vec<Child>;

    /// Best-effort native materialization of the collection at `key`.
    ///
    /// Stores without such a capability keep the default. An empty result
    /// and an error are treated the same by the binder: both fall back to
    /// element-by-element binding.
    fn try_bulk_get(
        &self,
        key: &str,
        element: &TypeDescriptor,
    ) -> Result<Option<Vec<BoundValue>>, BulkError> {
        let _ = (key, element);
        Ok(None)
    }
}

impl<S: ConfigStore + ?Sized> ConfigStore for &S {
    fn exists(&self, key: &str) -> bool {
        (**self).exists(key)
    }

    fn get_scalar(&self, key: &str) -> Option<&str> {
        (**self).get_scalar(key)
    }

    fn get_children(&self, key: &str) -> Vec<Child> {
        (**self).get_children(key)
    }

    fn try_bulk_get(
        &self,
        key: &str,
        element: &TypeDescriptor,
    ) -> Result<Option<Vec<BoundValue>>, BulkError> {
        (**self).try_bulk_get(key, element)
    }
}

/// Flat, ordered, in-memory store. Later inserts replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Layer `pairs` on top of the current contents.
    pub fn extend<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            self.insert(k, v);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn descendants<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}{KEY_DELIMITER}")
        };
        self.values
            .range(prefix.clone()..)
            .map(|(k, _)| k.as_str())
            .take_while(move |k| k.starts_with(&prefix))
            .map(move |k| &k[if key.is_empty() { 0 } else { key.len() + 1 }..])
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        store.extend(iter);
        store
    }
}

impl ConfigStore for MemoryStore {
    fn exists(&self, key: &str) -> bool {
        self.values.contains_key(key) || self.descendants(key).next().is_some()
    }

    fn get_scalar(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn get_children(&self, key: &str) -> Vec<Child> {
        let mut segments: Vec<&str> = self
            .descendants(key)
            .map(|rest| rest.split(KEY_DELIMITER).next().unwrap_or(rest))
            .collect();
        segments.sort_by(|a, b| compare_segments(a, b));
        segments.dedup();
        segments
            .into_iter()
            .map(|segment| Child {
                segment: segment.to_string(),
                key: child_key(key, segment),
            })
            .collect()
    }

    /// Handles collections of scalars only, converting each child value.
    fn try_bulk_get(
        &self,
        key: &str,
        element: &TypeDescriptor,
    ) -> Result<Option<Vec<BoundValue>>, BulkError> {
        let TypeDescriptor::Scalar(kind) = element else {
            return Err(BulkError::UnsupportedElement(element.type_name()));
        };

        let mut items = Vec::new();
        for child in self.get_children(key) {
            let raw = self
                .get_scalar(&child.key)
                .ok_or_else(|| BulkError::NotAValue(child.key.clone()))?;
            items.push(scalar::convert(raw, &child.key, *kind)?);
        }
        Ok(Some(items))
    }
}

/// Numeric segments first, in numeric order; everything else after, ordinal.
/// A segment is numeric when it is made of ASCII digits only, whatever its length.
fn compare_segments(a: &str, b: &str) -> Ordering {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| x.cmp(y))
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// The significant digits of an all-digit segment.
fn numeric(segment: &str) -> Option<&str> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = segment.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed })
}
