//! Type classification: maps a field's written type name to a [`TypeRef`].

use protoflex::codec::ScalarType;

use crate::context::{FileScope, SchemaContext};
use crate::output::TypeRef;

/// Looks type names up from inside one file.
pub(crate) struct TypeResolver<'a> {
    scope: &'a FileScope,
    imported: Vec<&'a FileScope>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(context: &'a SchemaContext, scope: &'a FileScope) -> Self {
        TypeResolver {
            scope,
            imported: context.visible(&scope.path),
        }
    }

    /// Classify `type_name` as written inside message `message` (dotted,
    /// relative to the package).
    ///
    /// Local enums, then local messages, then primitives, then enums and
    /// messages of imported files.
    pub fn classify(&self, message: &str, type_name: &str) -> Option<TypeRef> {
        self.local(message, type_name)
            .or_else(|| ScalarType::from_proto_name(type_name).map(TypeRef::Primitive))
            .or_else(|| self.imported(type_name))
    }

    fn local(&self, message: &str, type_name: &str) -> Option<TypeRef> {
        let absolute = type_name.starts_with('.');
        let name = self.scope.strip_package(type_name);

        for candidate in candidates(message, name, absolute) {
            if self.scope.enums.contains(&candidate) {
                return Some(TypeRef::Enum(self.scope.qualify(&candidate)));
            }
            if self.scope.messages.contains(&candidate) {
                return Some(TypeRef::Message(self.scope.qualify(&candidate)));
            }
        }
        None
    }

    fn imported(&self, type_name: &str) -> Option<TypeRef> {
        let enums = self.imported.iter().find_map(|file| {
            let name = file.strip_package(type_name);
            file.enums
                .contains(name)
                .then(|| TypeRef::Enum(file.qualify(name)))
        });
        enums.or_else(|| {
            self.imported.iter().find_map(|file| {
                let name = file.strip_package(type_name);
                file.messages
                    .contains(name)
                    .then(|| TypeRef::Message(file.qualify(name)))
            })
        })
    }
}

/// Names `name` could refer to from inside `message`, innermost scope first:
/// `Outer.Inner.X`, `Outer.X`, `X`.
fn candidates(message: &str, name: &str, absolute: bool) -> Vec<String> {
    let mut out = Vec::new();
    if !absolute {
        let mut scope = message;
        while !scope.is_empty() {
            out.push(format!("{scope}.{name}"));
            scope = scope.rsplit_once('.').map_or("", |(parent, _)| parent);
        }
    }
    out.push(name.to_string());
    out
}
