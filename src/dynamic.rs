//! Schema-driven messages that implement [`ReflectMessage`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{SecondsFormat, TimeDelta};
use serde_json::{Map, Number};

use crate::error::{Error, Result};
use crate::kind::{Kind, WellKnown};
use crate::reflect::{FieldInfo, OneofGroup, ReflectMessage, Value};
use crate::schema::{Cardinality, FieldDescriptor, MessageDescriptor, Registry};

/// A map key. Ordered so map output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl MapKey {
    fn from_value(value: Value<DynamicMessage>) -> Option<MapKey> {
        let key = match value {
            Value::Bool(v) => MapKey::Bool(v),
            Value::I32(v) => MapKey::I32(v),
            Value::I64(v) => MapKey::I64(v),
            Value::U32(v) => MapKey::U32(v),
            Value::U64(v) => MapKey::U64(v),
            Value::String(v) => MapKey::String(v),
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(v) => write!(f, "{v}"),
            MapKey::I32(v) => write!(f, "{v}"),
            MapKey::I64(v) => write!(f, "{v}"),
            MapKey::U32(v) => write!(f, "{v}"),
            MapKey::U64(v) => write!(f, "{v}"),
            MapKey::String(v) => f.write_str(v),
        }
    }
}

/// Storage for one set field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value<DynamicMessage>),
    List(Vec<Value<DynamicMessage>>),
    Map(BTreeMap<MapKey, Value<DynamicMessage>>),
}

/// A message whose shape comes from a compiled [`Registry`].
///
/// Fields are stored by number; unset fields have no entry.
#[derive(Clone)]
pub struct DynamicMessage {
    registry: Arc<Registry>,
    descriptor: Arc<MessageDescriptor>,
    values: BTreeMap<u32, FieldValue>,
}

impl DynamicMessage {
    /// An empty message of the named type.
    pub fn new(registry: &Arc<Registry>, name: &str) -> Result<Self> {
        let descriptor = Arc::clone(registry.message(name)?);
        Ok(Self {
            registry: Arc::clone(registry),
            descriptor,
            values: BTreeMap::new(),
        })
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Look up a field by its short name.
    pub fn field(&self, name: &str) -> Result<&FieldDescriptor> {
        self.descriptor.field(name).ok_or_else(|| {
            Error::Schema(format!(
                "message '{}' has no field '{name}'",
                self.descriptor.full_name
            ))
        })
    }

    /// The value of a singular field.
    pub fn get(&self, name: &str) -> Option<&Value<DynamicMessage>> {
        match self.raw(name)? {
            FieldValue::Single(v) => Some(v),
            _ => None,
        }
    }

    /// Elements of a list field. Empty when unset.
    pub fn get_list(&self, name: &str) -> &[Value<DynamicMessage>] {
        match self.raw(name) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn get_map(&self, name: &str) -> Option<&BTreeMap<MapKey, Value<DynamicMessage>>> {
        match self.raw(name)? {
            FieldValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// A singular nested message.
    pub fn get_message(&self, name: &str) -> Option<&DynamicMessage> {
        self.get(name).and_then(Value::as_message)
    }

    /// Whether a field is set. Lists and maps count as set when non-empty.
    pub fn has(&self, name: &str) -> bool {
        match self.raw(name) {
            Some(FieldValue::Single(_)) => true,
            Some(FieldValue::List(items)) => !items.is_empty(),
            Some(FieldValue::Map(entries)) => !entries.is_empty(),
            None => false,
        }
    }

    /// Number of set fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set a singular field by name.
    pub fn set_by_name(&mut self, name: &str, value: Value<DynamicMessage>) -> Result<()> {
        let field = self.field(name)?.clone();
        self.set(&field, value)
    }

    fn raw(&self, name: &str) -> Option<&FieldValue> {
        let field = self.descriptor.field(name)?;
        self.values.get(&field.number())
    }

    /// Render in protobuf JSON style.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = Map::new();
        for field in &self.descriptor.fields {
            let Some(value) = self.values.get(&field.number()) else {
                continue;
            };
            let json = match value {
                FieldValue::Single(v) => value_to_json(field, v),
                FieldValue::List(items) if items.is_empty() => continue,
                FieldValue::List(items) => {
                    serde_json::Value::Array(items.iter().map(|v| value_to_json(field, v)).collect())
                }
                FieldValue::Map(entries) if entries.is_empty() => continue,
                FieldValue::Map(entries) => {
                    let value_field = field.map_value().unwrap_or(field);
                    serde_json::Value::Object(
                        entries
                            .iter()
                            .map(|(k, v)| (k.to_string(), value_to_json(value_field, v)))
                            .collect(),
                    )
                }
            };
            out.insert(field.json_name().to_string(), json);
        }
        serde_json::Value::Object(out)
    }

    fn check_owner(&self, field: &FieldDescriptor) -> Result<()> {
        match self.descriptor.field_by_number(field.number()) {
            Some(own) if own.full_name() == field.full_name() => Ok(()),
            _ => Err(Error::Schema(format!(
                "field '{}' does not belong to message '{}'",
                field.full_name(),
                self.descriptor.full_name
            ))),
        }
    }

    fn check_cardinality(field: &FieldDescriptor, expected: Cardinality) -> Result<()> {
        if field.cardinality() == expected {
            return Ok(());
        }
        Err(Error::TypeMismatch {
            field: field.full_name().to_string(),
            expected: format!("{expected:?} field").to_lowercase(),
            found: format!("{:?} field", field.cardinality()).to_lowercase(),
        })
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.full_name == other.descriptor.full_name && self.values == other.values
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicMessage")
            .field("type", &self.descriptor.full_name)
            .field("values", &self.values)
            .finish()
    }
}

impl ReflectMessage for DynamicMessage {
    type Field = FieldDescriptor;

    fn full_name(&self) -> &str {
        &self.descriptor.full_name
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        self.descriptor.fields.clone()
    }

    fn oneofs(&self) -> Vec<OneofGroup<FieldDescriptor>> {
        self.descriptor.oneofs.clone()
    }

    fn which_oneof(&self, oneof: &str) -> Option<FieldDescriptor> {
        self.descriptor
            .oneof(oneof)?
            .fields
            .iter()
            .find(|f| self.values.contains_key(&f.number()))
            .cloned()
    }

    fn clear(&mut self, field: &FieldDescriptor) {
        self.values.remove(&field.number());
    }

    fn new_message(&self, field: &FieldDescriptor) -> Result<Self> {
        let target = if field.is_map() {
            field.map_value().unwrap_or(field)
        } else {
            field
        };
        let Some(name) = target.message_name().filter(|_| target.well_known().is_none()) else {
            return Err(Error::UnexpectedKind {
                field: target.full_name().to_string(),
                kind: target.kind().to_string(),
            });
        };
        DynamicMessage::new(&self.registry, name)
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value<Self>) -> Result<()> {
        self.check_owner(field)?;
        Self::check_cardinality(field, Cardinality::Singular)?;
        check_value(field, &value)?;
        if let Some(oneof) = field.containing_oneof().and_then(|o| self.descriptor.oneof(o)) {
            for member in &oneof.fields {
                self.values.remove(&member.number());
            }
        }
        self.values.insert(field.number(), FieldValue::Single(value));
        Ok(())
    }

    fn push(&mut self, field: &FieldDescriptor, value: Value<Self>) -> Result<()> {
        self.check_owner(field)?;
        Self::check_cardinality(field, Cardinality::List)?;
        check_value(field, &value)?;
        let slot = self
            .values
            .entry(field.number())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        if let FieldValue::List(items) = slot {
            items.push(value);
        }
        Ok(())
    }

    fn insert(&mut self, field: &FieldDescriptor, key: Value<Self>, value: Value<Self>) -> Result<()> {
        self.check_owner(field)?;
        Self::check_cardinality(field, Cardinality::Map)?;
        let (Some(key_field), Some(value_field)) = (field.map_key(), field.map_value()) else {
            return Err(Error::Schema(format!(
                "map field '{}' has no entry descriptors",
                field.full_name()
            )));
        };
        check_value(key_field, &key)?;
        check_value(value_field, &value)?;
        let key = MapKey::from_value(key).ok_or_else(|| Error::TypeMismatch {
            field: key_field.full_name().to_string(),
            expected: key_field.kind().to_string(),
            found: "non-key value".to_string(),
        })?;
        let slot = self
            .values
            .entry(field.number())
            .or_insert_with(|| FieldValue::Map(BTreeMap::new()));
        if let FieldValue::Map(entries) = slot {
            entries.insert(key, value);
        }
        Ok(())
    }
}

// ── Type checking ──

fn check_value(field: &FieldDescriptor, value: &Value<DynamicMessage>) -> Result<()> {
    let ok = match (field.well_known(), field.kind(), value) {
        (Some(WellKnown::Timestamp), _, Value::Timestamp(_)) => true,
        (Some(WellKnown::Duration), _, Value::Duration(_)) => true,
        (Some(_), _, _) => false,
        (None, Kind::Bool, Value::Bool(_)) => true,
        (None, Kind::Enum, Value::Enum(_)) => true,
        (None, Kind::Int32 | Kind::Sint32 | Kind::Sfixed32, Value::I32(_)) => true,
        (None, Kind::Uint32 | Kind::Fixed32, Value::U32(_)) => true,
        (None, Kind::Int64 | Kind::Sint64 | Kind::Sfixed64, Value::I64(_)) => true,
        (None, Kind::Uint64 | Kind::Fixed64, Value::U64(_)) => true,
        (None, Kind::Float, Value::F32(_)) => true,
        (None, Kind::Double, Value::F64(_)) => true,
        (None, Kind::String, Value::String(_)) => true,
        (None, Kind::Bytes, Value::Bytes(_)) => true,
        (None, Kind::Message | Kind::Group, Value::Message(m)) => {
            field.message_name() == Some(m.full_name())
        }
        _ => false,
    };
    if ok {
        return Ok(());
    }
    let found = match value {
        Value::Message(m) => m.full_name().to_string(),
        other => other.type_name().to_string(),
    };
    Err(Error::TypeMismatch {
        field: field.full_name().to_string(),
        expected: field
            .message_name()
            .map_or_else(|| field.kind().to_string(), str::to_string),
        found,
    })
}

// ── JSON rendering ──

fn value_to_json(field: &FieldDescriptor, value: &Value<DynamicMessage>) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Bool(v) => Json::Bool(*v),
        Value::Enum(n) => match field.enum_type().and_then(|e| e.name_of(*n)) {
            Some(name) => Json::String(name.to_string()),
            None => Json::from(*n),
        },
        Value::I32(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::I64(v) => Json::String(v.to_string()),
        Value::U64(v) => Json::String(v.to_string()),
        // Shortest f32 text, so 1.23f32 renders as 1.23.
        Value::F32(v) => float_to_json(v.to_string().parse().unwrap_or(f64::from(*v))),
        Value::F64(v) => float_to_json(*v),
        Value::String(v) => Json::String(v.clone()),
        Value::Bytes(v) => Json::String(STANDARD.encode(v)),
        Value::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Duration(d) => Json::String(format_duration(*d)),
        Value::Message(m) => m.to_json(),
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    match Number::from_f64(v) {
        Some(n) => serde_json::Value::Number(n),
        None if v.is_nan() => serde_json::Value::String("NaN".to_string()),
        None if v > 0.0 => serde_json::Value::String("Infinity".to_string()),
        None => serde_json::Value::String("-Infinity".to_string()),
    }
}

/// `"<seconds>[.<fraction>]s"` with 0, 3, 6 or 9 fractional digits.
///
/// - 90s → `"90s"`
/// - -1.5s → `"-1.500s"`
pub fn format_duration(d: TimeDelta) -> String {
    let secs = d.num_seconds();
    let nanos = d.subsec_nanos();
    let sign = if secs < 0 || nanos < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    let nanos = nanos.unsigned_abs();
    if nanos == 0 {
        format!("{sign}{secs}s")
    } else if nanos % 1_000_000 == 0 {
        format!("{sign}{secs}.{:03}s", nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        format!("{sign}{secs}.{:06}s", nanos / 1_000)
    } else {
        format!("{sign}{secs}.{nanos:09}s")
    }
}
