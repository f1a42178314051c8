//! Scope collection across files.
//!
//! Loading happens before any type is resolved: the entry file and every
//! transitive import are read and scanned exactly once, then type names are
//! looked up against the recorded scopes.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::ast::{self, ImportKind, ProtoFile, Syntax, Visitor};
use crate::config::Config;
use crate::error::Error;
use crate::source::{join_path, normalize_path, parent_dir, SchemaSource};

/// The symbols one file declares.
#[derive(Debug, Clone)]
pub(crate) struct FileScope {
    pub path: String,
    pub file: ProtoFile,
    /// Declared syntax, if the file has a syntax statement.
    pub syntax: Option<Syntax>,
    pub package: Option<String>,
    /// Resolved paths of the direct imports.
    pub imports: Vec<(String, ImportKind)>,
    /// Messages by dotted name relative to the package, e.g. `Outer.Inner`.
    pub messages: BTreeSet<String>,
    /// Enums by dotted name relative to the package.
    pub enums: BTreeSet<String>,
}

impl FileScope {
    fn scan(path: &str, file: ProtoFile) -> (Self, Vec<ast::Import>) {
        let mut scanner = ScopeScanner::default();
        file.accept(&mut scanner);

        let scope = FileScope {
            path: path.to_string(),
            file,
            syntax: scanner.syntax,
            package: scanner.package,
            imports: Vec::new(),
            messages: scanner.messages,
            enums: scanner.enums,
        };
        (scope, scanner.imports)
    }

    /// Fully-qualified name of a symbol declared in this file.
    pub fn qualify(&self, local: &str) -> String {
        match &self.package {
            Some(package) => format!("{package}.{local}"),
            None => local.to_string(),
        }
    }

    /// Strip a leading `.` and this file's package prefix from `name`.
    pub fn strip_package<'a>(&self, name: &'a str) -> &'a str {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.package
            .as_deref()
            .and_then(|package| name.strip_prefix(package))
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name)
    }
}

#[derive(Default)]
struct ScopeScanner {
    syntax: Option<Syntax>,
    package: Option<String>,
    imports: Vec<ast::Import>,
    messages: BTreeSet<String>,
    enums: BTreeSet<String>,
    nesting: Vec<String>,
}

impl ScopeScanner {
    fn dotted(&self, name: &str) -> String {
        let mut parts = self.nesting.clone();
        parts.push(name.to_string());
        parts.join(".")
    }
}

impl Visitor for ScopeScanner {
    fn visit_syntax(&mut self, syntax: Syntax) {
        self.syntax = Some(syntax);
    }

    fn visit_package(&mut self, package: &str) {
        self.package = Some(package.to_string());
    }

    fn visit_import(&mut self, import: &ast::Import) {
        self.imports.push(import.clone());
    }

    fn visit_message(&mut self, message: &ast::Message) {
        self.messages.insert(self.dotted(&message.name));
        self.nesting.push(message.name.clone());
        ast::walk_message(self, message);
        self.nesting.pop();
    }

    fn visit_enum(&mut self, enumeration: &ast::Enum) {
        self.enums.insert(self.dotted(&enumeration.name));
    }
}

/// Every file reachable from the entry file, scanned.
#[derive(Debug)]
pub(crate) struct SchemaContext {
    files: HashMap<String, FileScope>,
    /// Load order: every file comes after the files it imports.
    order: Vec<String>,
    entry: String,
}

impl SchemaContext {
    pub fn load<S>(config: &Config, source: &S, entry: &str) -> Result<Self, Error>
    where
        S: SchemaSource + ?Sized,
    {
        let entry = normalize_path(entry);
        if !source.contains(&entry) {
            return Err(Error::FileNotFound { path: entry });
        }

        let mut context = SchemaContext {
            files: HashMap::new(),
            order: Vec::new(),
            entry: entry.clone(),
        };
        context.visit(config, source, entry, &mut Vec::new())?;
        Ok(context)
    }

    fn visit<S>(
        &mut self,
        config: &Config,
        source: &S,
        path: String,
        stack: &mut Vec<String>,
    ) -> Result<(), Error>
    where
        S: SchemaSource + ?Sized,
    {
        if let Some(start) = stack.iter().position(|p| *p == path) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(path);
            return Err(Error::ImportCycle { cycle });
        }
        if self.files.contains_key(&path) {
            return Ok(());
        }

        let file = source
            .load(&path)
            .ok_or_else(|| Error::FileNotFound { path: path.clone() })?;
        let (mut scope, imports) = FileScope::scan(&path, file);
        debug!(
            file = %path,
            messages = scope.messages.len(),
            enums = scope.enums.len(),
            imports = imports.len(),
            "scanned schema file"
        );

        for import in imports {
            let resolved = resolve_import(config, source, &path, &import.path)?;
            scope.imports.push((resolved, import.kind));
        }

        stack.push(path.clone());
        for (import, _) in &scope.imports {
            self.visit(config, source, import.clone(), stack)?;
        }
        stack.pop();

        self.order.push(path.clone());
        self.files.insert(path, scope);
        Ok(())
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn file(&self, path: &str) -> Option<&FileScope> {
        self.files.get(path)
    }

    /// All files, each after the files it imports.
    pub fn files(&self) -> impl Iterator<Item = &FileScope> {
        self.order.iter().filter_map(|path| self.files.get(path))
    }

    /// Files whose symbols `path` can refer to: its direct imports, plus
    /// whatever those re-export through `import public`, transitively.
    pub fn visible(&self, path: &str) -> Vec<&FileScope> {
        let mut seen: Vec<&str> = Vec::new();
        if let Some(scope) = self.files.get(path) {
            for (import, _) in &scope.imports {
                self.collect_public(import, &mut seen);
            }
        }
        seen.into_iter().filter_map(|p| self.files.get(p)).collect()
    }

    fn collect_public<'a>(&'a self, path: &'a str, seen: &mut Vec<&'a str>) {
        if seen.contains(&path) {
            return;
        }
        seen.push(path);
        if let Some(scope) = self.files.get(path) {
            for (import, kind) in &scope.imports {
                if *kind == ImportKind::Public {
                    self.collect_public(import, seen);
                }
            }
        }
    }
}

/// Find `import` relative to the importing file, then under each include
/// root, then at the root of the source.
fn resolve_import<S>(config: &Config, source: &S, importer: &str, import: &str) -> Result<String, Error>
where
    S: SchemaSource + ?Sized,
{
    let relative = join_path(parent_dir(importer), import);
    let candidates = std::iter::once(relative)
        .chain(config.includes.iter().map(|root| join_path(root, import)))
        .chain(std::iter::once(normalize_path(import)));

    for candidate in candidates {
        if source.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::ImportNotFound {
        file: importer.to_string(),
        import: import.to_string(),
    })
}
