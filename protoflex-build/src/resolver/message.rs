//! Field table resolution for a single message.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use protoflex::codec::{CompositeCodec, FieldCodec, ScalarCodec, ScalarType};
use protoflex::schema::DefaultValue;
use protoflex::wire::{WireType, MAXIMUM_TAG_VAL, MINIMUM_TAG_VAL};
use protoflex::EnumSchema;
use tracing::{trace, warn};

use super::types::TypeResolver;
use crate::ast::{self, MessageItem, Syntax};
use crate::context::FileScope;
use crate::output::{FieldKind, ResolvedField, ResolvedMessage, TypeRef};
use crate::Error;

pub(crate) struct MessageResolver<'a> {
    pub scope: &'a FileScope,
    pub syntax: Syntax,
    pub types: TypeResolver<'a>,
    /// Every enum resolved so far, by fully-qualified name.
    pub enums: &'a HashMap<String, Arc<EnumSchema>>,
}

impl MessageResolver<'_> {
    /// Resolve `message`, declared as `local` (dotted, relative to the
    /// package).
    pub fn resolve(&self, local: &str, message: &ast::Message) -> Result<ResolvedMessage, Error> {
        let name = self.scope.qualify(local);
        let mut fields = Vec::new();
        for item in &message.items {
            match item {
                MessageItem::Field(field) => fields.push(self.field(local, &name, field, None)?),
                MessageItem::Oneof(oneof) => {
                    for field in &oneof.fields {
                        fields.push(self.field(local, &name, field, Some(&oneof.name))?);
                    }
                }
                MessageItem::MapField(field) => fields.push(self.map_field(local, &name, field)?),
                MessageItem::Message(_) | MessageItem::Enum(_) => (),
            }
        }

        let mut ids = HashSet::new();
        for field in &fields {
            if !ids.insert(field.id) {
                return Err(Error::DuplicateFieldId {
                    file: self.scope.path.clone(),
                    message: name,
                    id: field.id,
                });
            }
        }

        let message = ResolvedMessage { name, fields };
        // Building the runtime schema catches what is left, such as a
        // repeated oneof member or a reused field name.
        message.schema()?;
        Ok(message)
    }

    fn field(
        &self,
        local: &str,
        message: &str,
        field: &ast::Field,
        oneof: Option<&str>,
    ) -> Result<ResolvedField, Error> {
        self.check_id(message, &field.name, field.id)?;
        let (ty, element) = self.classify(local, message, &field.name, &field.type_name)?;
        let element_wire = element.wire_type();

        let (kind, codec, packed) = if field.repeated {
            let packed = self.packed(message, field, &element);
            let codec = if packed {
                CompositeCodec::packed(element)?
            } else {
                CompositeCodec::repeated(element)
            };
            (FieldKind::Repeated(ty), FieldCodec::from(codec), packed)
        } else {
            (FieldKind::Singular(ty), FieldCodec::Scalar(element), false)
        };

        let wire_type = if packed { WireType::Len } else { element_wire };
        let default = match oneof {
            Some(_) => DefaultValue::Absent,
            None => codec.default_value(),
        };
        trace!(parent = message, field = %field.name, kind = %kind, packed, "classified field");

        Ok(ResolvedField {
            name: field.name.clone(),
            id: field.id,
            kind,
            wire_type,
            packed,
            codec,
            default,
            oneof: oneof.map(str::to_string),
            recursive: false,
        })
    }

    fn map_field(&self, local: &str, message: &str, field: &ast::MapField) -> Result<ResolvedField, Error> {
        self.check_id(message, &field.name, field.id)?;
        let key = ScalarType::from_proto_name(&field.key_type)
            .filter(|ty| ty.is_map_key())
            .ok_or_else(|| Error::InvalidMapKey {
                file: self.scope.path.clone(),
                message: message.to_string(),
                field: field.name.clone(),
                key_type: field.key_type.clone(),
            })?;
        let (value, element) = self.classify(local, message, &field.name, &field.value_type)?;
        let codec = CompositeCodec::map(key, element)?;

        let kind = FieldKind::Map { key, value };
        trace!(parent = message, field = %field.name, kind = %kind, "classified field");

        Ok(ResolvedField {
            name: field.name.clone(),
            id: field.id,
            kind,
            wire_type: WireType::Len,
            packed: false,
            default: DefaultValue::EmptyMap,
            codec: codec.into(),
            oneof: None,
            recursive: false,
        })
    }

    /// Classify a written type name and bind its element codec.
    fn classify(
        &self,
        local: &str,
        message: &str,
        field: &str,
        type_name: &str,
    ) -> Result<(TypeRef, ScalarCodec), Error> {
        let unresolved = || Error::UnresolvedType {
            file: self.scope.path.clone(),
            message: message.to_string(),
            field: field.to_string(),
            type_name: type_name.to_string(),
        };

        let ty = self.types.classify(local, type_name).ok_or_else(unresolved)?;
        let codec = match &ty {
            TypeRef::Primitive(ty) => ScalarCodec::Primitive(*ty),
            TypeRef::Enum(name) => {
                let schema = self.enums.get(name).ok_or_else(unresolved)?;
                ScalarCodec::Enum(Arc::clone(schema))
            }
            TypeRef::Message(name) => ScalarCodec::Message(name.clone()),
        };
        Ok((ty, codec))
    }

    fn packed(&self, message: &str, field: &ast::Field, element: &ScalarCodec) -> bool {
        match field.bool_option("packed") {
            Some(true) if element.is_packable() => true,
            Some(true) => {
                warn!(
                    parent = message,
                    field = %field.name,
                    element = %element,
                    "ignoring packed option on a type that cannot be packed"
                );
                false
            }
            Some(false) => false,
            None => self.syntax == Syntax::Proto3 && element.is_packable(),
        }
    }

    fn check_id(&self, message: &str, field: &str, id: u32) -> Result<(), Error> {
        if (MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&id) {
            return Ok(());
        }
        Err(Error::InvalidFieldId {
            file: self.scope.path.clone(),
            message: message.to_string(),
            field: field.to_string(),
            id,
        })
    }
}
