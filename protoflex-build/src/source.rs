//! Read-only access to schema files.

use std::collections::BTreeMap;

use crate::ast::ProtoFile;

/// Where the resolver loads schema files from.
///
/// Paths are `/`-separated and relative to the root of the source.
pub trait SchemaSource {
    /// Load the parsed file at `path`, if it exists.
    fn load(&self, path: &str) -> Option<ProtoFile>;

    fn contains(&self, path: &str) -> bool;
}

/// A [`SchemaSource`] backed by an in-memory map of parsed files.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, ProtoFile>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `file` at `path`, replacing any file already there.
    pub fn insert(&mut self, path: impl AsRef<str>, file: ProtoFile) -> &mut Self {
        self.files.insert(normalize_path(path.as_ref()), file);
        self
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, path: impl AsRef<str>, file: ProtoFile) -> Self {
        self.insert(path, file);
        self
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl SchemaSource for MemorySource {
    fn load(&self, path: &str) -> Option<ProtoFile> {
        self.files.get(&normalize_path(path)).cloned()
    }

    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }
}

impl<S: SchemaSource + ?Sized> SchemaSource for &S {
    fn load(&self, path: &str) -> Option<ProtoFile> {
        (**self).load(path)
    }

    fn contains(&self, path: &str) -> bool {
        (**self).contains(path)
    }
}

/// Collapse `.`, `..` and empty components of a `/`-separated path.
///
/// A `..` that would climb above the root is dropped.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => (),
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    parts.join("/")
}

/// Directory part of a normalized path, empty at the root.
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join `path` onto `dir` and normalize the result.
pub(crate) fn join_path(dir: &str, path: &str) -> String {
    if dir.is_empty() {
        normalize_path(path)
    } else {
        normalize_path(&format!("{dir}/{path}"))
    }
}
