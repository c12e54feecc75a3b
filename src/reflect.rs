//! The reflective view of a message that the engine populates.
//!
//! The engine is written against [`ReflectMessage`] and [`FieldInfo`] only, so
//! any host message system can be populated once it implements these two
//! traits. [`DynamicMessage`](crate::dynamic::DynamicMessage) is the
//! implementation shipped with this crate.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::directive::Directive;
use crate::error::Result;
use crate::kind::{Kind, WellKnown};

/// A typed field value.
///
/// `Timestamp` and `Duration` stand in for the two well-known message types,
/// which are filled like scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<M> {
    Bool(bool),
    /// An enum number. Not necessarily one the enum declares.
    Enum(i32),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    Message(M),
}

impl<M> Value<M> {
    /// Short name of the variant, used in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Enum(_) => "enum",
            Value::I32(_) => "int32",
            Value::I64(_) => "int64",
            Value::U32(_) => "uint32",
            Value::U64(_) => "uint64",
            Value::F32(_) => "float",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
            Value::Message(_) => "message",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&M> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }
}

impl<M> fmt::Display for Value<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Enum(v) | Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "{} bytes", v.len()),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Duration(v) => write!(f, "{v}"),
            Value::Message(_) => f.write_str("<message>"),
        }
    }
}

/// Read-only description of one field.
pub trait FieldInfo {
    /// The short field name, e.g. `first_name`.
    fn name(&self) -> &str;

    /// The name qualified by the containing message, e.g. `example.User.first_name`.
    fn full_name(&self) -> &str;

    fn kind(&self) -> Kind;

    fn is_list(&self) -> bool;

    fn is_map(&self) -> bool;

    /// Key descriptor of a map field.
    fn map_key(&self) -> Option<&Self>;

    /// Value descriptor of a map field.
    fn map_value(&self) -> Option<&Self>;

    /// Fully-qualified type name of a message-kind field.
    fn message_name(&self) -> Option<&str>;

    /// Declared numbers of an enum-kind field, in declaration order.
    fn enum_numbers(&self) -> Vec<i32>;

    /// Name of the union group this field belongs to.
    fn containing_oneof(&self) -> Option<&str>;

    /// The resolved population directive, if the schema attaches one.
    fn directive(&self) -> Option<&Directive>;

    /// The well-known type a message-kind field refers to.
    fn well_known(&self) -> Option<WellKnown> {
        if !self.kind().is_message() {
            return None;
        }
        self.message_name().and_then(WellKnown::from_full_name)
    }
}

/// Fields of one union group, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofGroup<F> {
    pub name: String,
    pub fields: Vec<F>,
}

/// A mutable message whose shape is discovered at runtime.
pub trait ReflectMessage: Sized {
    type Field: FieldInfo + Clone;

    fn full_name(&self) -> &str;

    /// All fields in declaration order, union members included.
    fn fields(&self) -> Vec<Self::Field>;

    fn oneofs(&self) -> Vec<OneofGroup<Self::Field>>;

    /// The currently set member of the named union group.
    fn which_oneof(&self, oneof: &str) -> Option<Self::Field>;

    /// Reset a field to its absent state. Lists and maps become empty.
    fn clear(&mut self, field: &Self::Field);

    /// Allocate an empty message of the type `field` holds: its singular value,
    /// list element or map value.
    fn new_message(&self, field: &Self::Field) -> Result<Self>;

    /// Store a singular value.
    fn set(&mut self, field: &Self::Field, value: Value<Self>) -> Result<()>;

    /// Append to a list field.
    fn push(&mut self, field: &Self::Field, value: Value<Self>) -> Result<()>;

    /// Insert a map entry, replacing any entry with an equal key.
    fn insert(&mut self, field: &Self::Field, key: Value<Self>, value: Value<Self>) -> Result<()>;
}
