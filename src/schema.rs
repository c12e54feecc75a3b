//! Message schemas: JSON definitions, loading, and compilation.
//!
//! A schema file describes messages and enums the way a `.proto` file would,
//! with population directives attached to fields under `"generate"`:
//!
//! ```json
//! {
//!   "package": "example",
//!   "enums": {
//!     "PetType": { "values": [
//!       { "name": "PET_TYPE_UNSPECIFIED", "number": 0 },
//!       { "name": "PET_TYPE_DOG", "number": 1 }
//!     ] }
//!   },
//!   "messages": {
//!     "User": { "fields": [
//!       { "name": "first_name", "type": "string", "generate": { "tag": "{firstname}" } },
//!       { "name": "pets", "map": { "key": "string", "value": "PetType" } },
//!       { "name": "created", "type": "google.protobuf.Timestamp" }
//!     ] }
//!   }
//! }
//! ```
//!
//! [`Registry::compile`] resolves every type reference and directive once, so
//! population never re-reads the raw definitions.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::directive::{Directive, DirectiveSpec};
use crate::error::{Error, Result};
use crate::kind::{Kind, WellKnown, qualify, to_json_name};
use crate::reflect::{FieldInfo, OneofGroup};

// ── Schema file ──

/// A schema file as written on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    /// Package prefix for every message and enum (e.g., `"example"`).
    #[serde(default)]
    pub package: String,

    /// Messages keyed by name relative to the package.
    #[serde(default)]
    pub messages: BTreeMap<String, MessageDef>,

    /// Enums keyed by name relative to the package.
    #[serde(default)]
    pub enums: BTreeMap<String, EnumDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDef {
    /// Free-form text shown by `proto-faker check`.
    #[serde(default)]
    pub description: String,

    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A single field of a message.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    /// Snake_case field name (e.g., `"first_name"`).
    pub name: String,

    /// Field number. Missing numbers continue after the highest explicit one.
    #[serde(default)]
    pub number: Option<u32>,

    /// Scalar keyword, well-known type, or message/enum name. Absent for maps.
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,

    /// Whether this is a list field (proto `repeated`).
    #[serde(default)]
    pub repeated: bool,

    /// Key and value types of a map field.
    #[serde(default)]
    pub map: Option<MapDef>,

    /// Union group the field belongs to.
    #[serde(default)]
    pub oneof: Option<String>,

    /// Population directive.
    #[serde(default)]
    pub generate: Option<DirectiveSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapDef {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

/// Load a schema file from disk.
pub fn load_schema(path: &Path) -> Result<SchemaFile> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let schema: SchemaFile = serde_json::from_str(&content)?;
    Ok(schema)
}

// ── Descriptors ──

/// A compiled enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub full_name: String,
    pub values: Vec<EnumValueDef>,
}

impl EnumDescriptor {
    /// Declared numbers, in declaration order.
    pub fn numbers(&self) -> Vec<i32> {
        self.values.iter().map(|v| v.number).collect()
    }

    /// Name of the first value declared with `number`.
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.number == number)
            .map(|v| v.name.as_str())
    }
}

/// Whether a field holds one value, a list, or a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    List,
    Map,
}

/// A compiled field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    full_name: String,
    json_name: String,
    number: u32,
    kind: Kind,
    cardinality: Cardinality,
    message_name: Option<String>,
    enum_type: Option<Arc<EnumDescriptor>>,
    oneof: Option<String>,
    directive: Option<Directive>,
    map_entry: Option<Box<(FieldDescriptor, FieldDescriptor)>>,
}

impl FieldDescriptor {
    pub fn number(&self) -> u32 {
        self.number
    }

    /// lowerCamelCase name used in JSON output.
    pub fn json_name(&self) -> &str {
        &self.json_name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn enum_type(&self) -> Option<&EnumDescriptor> {
        self.enum_type.as_deref()
    }
}

impl FieldInfo for FieldDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn kind(&self) -> Kind {
        self.kind
    }

    fn is_list(&self) -> bool {
        self.cardinality == Cardinality::List
    }

    fn is_map(&self) -> bool {
        self.cardinality == Cardinality::Map
    }

    fn map_key(&self) -> Option<&Self> {
        self.map_entry.as_deref().map(|(key, _)| key)
    }

    fn map_value(&self) -> Option<&Self> {
        self.map_entry.as_deref().map(|(_, value)| value)
    }

    fn message_name(&self) -> Option<&str> {
        self.message_name.as_deref()
    }

    fn enum_numbers(&self) -> Vec<i32> {
        self.enum_type
            .as_ref()
            .map(|e| e.numbers())
            .unwrap_or_default()
    }

    fn containing_oneof(&self) -> Option<&str> {
        self.oneof.as_deref()
    }

    fn directive(&self) -> Option<&Directive> {
        self.directive.as_ref()
    }
}

/// A compiled message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescriptor {
    pub full_name: String,
    pub description: String,
    /// Fields in declaration order, union members included.
    pub fields: Vec<FieldDescriptor>,
    /// Union groups in order of first appearance.
    pub oneofs: Vec<OneofGroup<FieldDescriptor>>,
}

impl MessageDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    pub fn oneof(&self, name: &str) -> Option<&OneofGroup<FieldDescriptor>> {
        self.oneofs.iter().find(|o| o.name == name)
    }
}

// ── Registry ──

/// All messages and enums of a compiled schema, keyed by full name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    package: String,
    messages: BTreeMap<String, Arc<MessageDescriptor>>,
    enums: BTreeMap<String, Arc<EnumDescriptor>>,
}

impl Registry {
    /// Load and compile a schema file.
    pub fn from_path(path: &Path) -> Result<Registry> {
        Self::compile(&load_schema(path)?)
    }

    /// Resolve types, validate fields, and resolve directives.
    pub fn compile(schema: &SchemaFile) -> Result<Registry> {
        let package = schema.package.trim_matches('.').to_string();

        let mut enums = BTreeMap::new();
        for (name, def) in &schema.enums {
            let full_name = qualify(&package, name);
            enums.insert(full_name.clone(), Arc::new(compile_enum(full_name, def)?));
        }

        let message_names: BTreeSet<String> = schema
            .messages
            .keys()
            .map(|name| qualify(&package, name))
            .collect();
        if let Some(clash) = message_names.iter().find(|n| enums.contains_key(*n)) {
            return Err(Error::Schema(format!(
                "'{clash}' is defined as both a message and an enum"
            )));
        }

        let resolver = TypeResolver {
            package: &package,
            messages: &message_names,
            enums: &enums,
        };
        let mut messages = BTreeMap::new();
        for (name, def) in &schema.messages {
            let full_name = qualify(&package, name);
            let descriptor = compile_message(&resolver, full_name.clone(), def)?;
            messages.insert(full_name, Arc::new(descriptor));
        }

        tracing::debug!(
            package = %package,
            messages = messages.len(),
            enums = enums.len(),
            "compiled schema"
        );
        Ok(Registry {
            package,
            messages,
            enums,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Look up a message by full name or by name relative to the package.
    pub fn message(&self, name: &str) -> Result<&Arc<MessageDescriptor>> {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.messages
            .get(name)
            .or_else(|| self.messages.get(&qualify(&self.package, name)))
            .ok_or_else(|| Error::MessageNotFound {
                name: name.to_string(),
                available: self
                    .messages
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn enum_type(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.enums
            .get(name)
            .or_else(|| self.enums.get(&qualify(&self.package, name)))
    }

    pub fn messages(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.messages.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumDescriptor>> {
        self.enums.values()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Number of fields carrying a directive.
    pub fn directive_count(&self) -> usize {
        self.messages
            .values()
            .flat_map(|m| m.fields.iter())
            .filter(|f| f.directive.is_some())
            .count()
    }
}

fn compile_enum(full_name: String, def: &EnumDef) -> Result<EnumDescriptor> {
    if def.values.is_empty() {
        return Err(Error::Schema(format!("enum '{full_name}' declares no values")));
    }
    let mut seen = BTreeSet::new();
    for value in &def.values {
        if !seen.insert(value.name.as_str()) {
            return Err(Error::Schema(format!(
                "enum '{full_name}' declares '{}' twice",
                value.name
            )));
        }
    }
    Ok(EnumDescriptor {
        full_name,
        values: def.values.clone(),
    })
}

struct TypeResolver<'a> {
    package: &'a str,
    messages: &'a BTreeSet<String>,
    enums: &'a BTreeMap<String, Arc<EnumDescriptor>>,
}

/// A resolved type reference.
struct ResolvedType {
    kind: Kind,
    message_name: Option<String>,
    enum_type: Option<Arc<EnumDescriptor>>,
}

impl TypeResolver<'_> {
    /// Resolution order: scalar keyword, well-known type, `.absolute` name,
    /// package-relative name, name as written.
    fn resolve(&self, field: &str, type_name: &str) -> Result<ResolvedType> {
        if let Some(kind) = Kind::from_scalar_name(type_name) {
            return Ok(ResolvedType {
                kind,
                message_name: None,
                enum_type: None,
            });
        }
        if let Some(wkt) = WellKnown::from_full_name(type_name) {
            return Ok(ResolvedType {
                kind: Kind::Message,
                message_name: Some(wkt.full_name().to_string()),
                enum_type: None,
            });
        }

        let candidates = match type_name.strip_prefix('.') {
            Some(absolute) => vec![absolute.to_string()],
            None => vec![qualify(self.package, type_name), type_name.to_string()],
        };
        for candidate in candidates {
            if self.messages.contains(&candidate) {
                return Ok(ResolvedType {
                    kind: Kind::Message,
                    message_name: Some(candidate),
                    enum_type: None,
                });
            }
            if let Some(e) = self.enums.get(&candidate) {
                return Ok(ResolvedType {
                    kind: Kind::Enum,
                    message_name: None,
                    enum_type: Some(Arc::clone(e)),
                });
            }
        }
        Err(Error::UnknownType {
            field: field.to_string(),
            type_name: type_name.to_string(),
        })
    }
}

/// Largest field number protobuf allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

fn compile_message(
    resolver: &TypeResolver<'_>,
    full_name: String,
    def: &MessageDef,
) -> Result<MessageDescriptor> {
    let mut next_number = def
        .fields
        .iter()
        .filter_map(|f| f.number)
        .max()
        .unwrap_or(0)
        .saturating_add(1);
    let mut names = BTreeSet::new();
    let mut numbers = BTreeSet::new();
    let mut fields = Vec::with_capacity(def.fields.len());

    for field_def in &def.fields {
        let field_name = format!("{full_name}.{}", field_def.name);
        if field_def.name.is_empty() {
            return Err(Error::Schema(format!("message '{full_name}' has an unnamed field")));
        }
        if !names.insert(field_def.name.as_str()) {
            return Err(Error::Schema(format!("duplicate field name '{field_name}'")));
        }

        let number = match field_def.number {
            Some(0) => {
                return Err(Error::Schema(format!(
                    "field '{field_name}' has number 0; numbers start at 1"
                )));
            }
            Some(n) => n,
            None => {
                let n = next_number;
                next_number = n.saturating_add(1);
                n
            }
        };
        if number > MAX_FIELD_NUMBER {
            return Err(Error::Schema(format!(
                "field '{field_name}' has number {number}, above the maximum {MAX_FIELD_NUMBER}"
            )));
        }
        if !numbers.insert(number) {
            return Err(Error::Schema(format!(
                "field '{field_name}' reuses number {number}"
            )));
        }

        fields.push(compile_field(resolver, field_def, field_name, number)?);
    }

    let mut oneofs: Vec<OneofGroup<FieldDescriptor>> = Vec::new();
    for field in &fields {
        let Some(name) = &field.oneof else { continue };
        match oneofs.iter_mut().find(|o| &o.name == name) {
            Some(group) => group.fields.push(field.clone()),
            None => oneofs.push(OneofGroup {
                name: name.clone(),
                fields: vec![field.clone()],
            }),
        }
    }

    Ok(MessageDescriptor {
        full_name,
        description: def.description.clone(),
        fields,
        oneofs,
    })
}

fn compile_field(
    resolver: &TypeResolver<'_>,
    def: &FieldDef,
    full_name: String,
    number: u32,
) -> Result<FieldDescriptor> {
    let directive = def
        .generate
        .as_ref()
        .map(|spec| spec.resolve(&full_name))
        .transpose()?;

    let (cardinality, resolved, map_entry) = match (&def.map, &def.type_name) {
        (Some(_), Some(_)) => {
            return Err(Error::Schema(format!(
                "map field '{full_name}' must not also declare a type"
            )));
        }
        (Some(_), None) if def.repeated => {
            return Err(Error::Schema(format!(
                "map field '{full_name}' cannot be repeated"
            )));
        }
        (Some(map), None) => {
            let key = resolver.resolve(&full_name, &map.key)?;
            if !key.kind.is_map_key() {
                return Err(Error::Schema(format!(
                    "map field '{full_name}' has invalid key type '{}'",
                    map.key
                )));
            }
            let value = resolver.resolve(&full_name, &map.value)?;
            let entry = (
                entry_field(&full_name, "key", 1, key),
                entry_field(&full_name, "value", 2, value),
            );
            let placeholder = ResolvedType {
                kind: Kind::Message,
                message_name: None,
                enum_type: None,
            };
            (Cardinality::Map, placeholder, Some(Box::new(entry)))
        }
        (None, Some(type_name)) => {
            let cardinality = if def.repeated {
                Cardinality::List
            } else {
                Cardinality::Singular
            };
            (cardinality, resolver.resolve(&full_name, type_name)?, None)
        }
        (None, None) => {
            return Err(Error::Schema(format!("field '{full_name}' has no type")));
        }
    };

    if def.oneof.is_some() && cardinality != Cardinality::Singular {
        return Err(Error::Schema(format!(
            "field '{full_name}' is in a oneof and cannot be repeated or a map"
        )));
    }

    if let Some(d) = &directive {
        if d.list.is_some() && cardinality != Cardinality::List {
            tracing::warn!(field = %full_name, "repeated overrides on a non-repeated field are ignored");
        }
        if d.map.is_some() && cardinality != Cardinality::Map {
            tracing::warn!(field = %full_name, "map overrides on a non-map field are ignored");
        }
    }

    Ok(FieldDescriptor {
        json_name: to_json_name(&def.name),
        name: def.name.clone(),
        full_name,
        number,
        kind: resolved.kind,
        cardinality,
        message_name: resolved.message_name,
        enum_type: resolved.enum_type,
        oneof: def.oneof.clone(),
        directive,
        map_entry,
    })
}

fn entry_field(map_name: &str, name: &str, number: u32, resolved: ResolvedType) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        full_name: format!("{map_name}.{name}"),
        json_name: name.to_string(),
        number,
        kind: resolved.kind,
        cardinality: Cardinality::Singular,
        message_name: resolved.message_name,
        enum_type: resolved.enum_type,
        oneof: None,
        directive: None,
        map_entry: None,
    }
}
