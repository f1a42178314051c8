//! Configuration for schema resolution.

use crate::ast::Syntax;
use crate::output::Resolution;
use crate::source::{normalize_path, SchemaSource};

/// Configuration for schema resolution.
#[derive(Debug, Clone)]
pub struct Config {
    /// Roots searched for imports after the importing file's own directory.
    pub(crate) includes: Vec<String>,

    /// Syntax assumed for files without a syntax statement.
    pub(crate) default_syntax: Syntax,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            default_syntax: Syntax::Proto3,
        }
    }
}

impl Config {
    /// Create a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include root used to resolve imports.
    ///
    /// Roots are searched in the order they were added.
    pub fn include(&mut self, root: impl AsRef<str>) -> &mut Self {
        self.includes.push(normalize_path(root.as_ref()));
        self
    }

    /// Syntax assumed for files that do not declare one.
    pub fn default_syntax(&mut self, syntax: Syntax) -> &mut Self {
        self.default_syntax = syntax;
        self
    }

    /// Resolve `entry` and every file it imports from `source`.
    pub fn resolve<S>(&self, source: &S, entry: impl AsRef<str>) -> Result<Resolution, crate::Error>
    where
        S: SchemaSource + ?Sized,
    {
        crate::resolver::resolve(self, source, entry.as_ref())
    }
}
