//! Field kinds and the well-known message types treated as scalars.
//!
//! # Scalar Type Table
//!
//! | Proto type | Kind | Value width |
//! |------------|------|-------------|
//! | `int32`, `sint32`, `sfixed32` | signed | 32 |
//! | `uint32`, `fixed32` | unsigned | 32 |
//! | `int64`, `sint64`, `sfixed64` | signed | 64 |
//! | `uint64`, `fixed64` | unsigned | 64 |
//! | `float` / `double` | float | 32 / 64 |
//! | `bool`, `string`, `bytes` | | |
//! | `google.protobuf.Timestamp` | message, generated as an instant | |
//! | `google.protobuf.Duration` | message, generated as a duration | |

use std::fmt;

/// Fully-qualified name of the instant-in-time well-known type.
pub const TIMESTAMP_FULL_NAME: &str = "google.protobuf.Timestamp";

/// Fully-qualified name of the duration well-known type.
pub const DURATION_FULL_NAME: &str = "google.protobuf.Duration";

/// The declared kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Enum,
    Int32,
    Sint32,
    Sfixed32,
    Uint32,
    Fixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Message,
    Group,
}

impl Kind {
    /// Map a protobuf scalar type name to its kind.
    ///
    /// Returns `None` for anything that is not a scalar keyword; enum and
    /// message references must be resolved by the caller.
    pub fn from_scalar_name(name: &str) -> Option<Kind> {
        let kind = match name {
            "bool" => Kind::Bool,
            "int32" => Kind::Int32,
            "sint32" => Kind::Sint32,
            "sfixed32" => Kind::Sfixed32,
            "uint32" => Kind::Uint32,
            "fixed32" => Kind::Fixed32,
            "int64" => Kind::Int64,
            "sint64" => Kind::Sint64,
            "sfixed64" => Kind::Sfixed64,
            "uint64" => Kind::Uint64,
            "fixed64" => Kind::Fixed64,
            "float" => Kind::Float,
            "double" => Kind::Double,
            "string" => Kind::String,
            "bytes" => Kind::Bytes,
            _ => return None,
        };
        Some(kind)
    }

    /// The protobuf keyword for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Enum => "enum",
            Kind::Int32 => "int32",
            Kind::Sint32 => "sint32",
            Kind::Sfixed32 => "sfixed32",
            Kind::Uint32 => "uint32",
            Kind::Fixed32 => "fixed32",
            Kind::Int64 => "int64",
            Kind::Sint64 => "sint64",
            Kind::Sfixed64 => "sfixed64",
            Kind::Uint64 => "uint64",
            Kind::Fixed64 => "fixed64",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Message => "message",
            Kind::Group => "group",
        }
    }

    /// Message and group kinds hold nested messages.
    pub fn is_message(self) -> bool {
        matches!(self, Kind::Message | Kind::Group)
    }

    /// Whether the kind may be used as a map key.
    pub fn is_map_key(self) -> bool {
        !matches!(
            self,
            Kind::Enum | Kind::Float | Kind::Double | Kind::Bytes | Kind::Message | Kind::Group
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message types that are generated as pseudo-scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnown {
    Timestamp,
    Duration,
}

impl WellKnown {
    /// Recognize a fully-qualified message name. A leading `.` is tolerated.
    pub fn from_full_name(name: &str) -> Option<WellKnown> {
        match name.strip_prefix('.').unwrap_or(name) {
            TIMESTAMP_FULL_NAME => Some(WellKnown::Timestamp),
            DURATION_FULL_NAME => Some(WellKnown::Duration),
            _ => None,
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            WellKnown::Timestamp => TIMESTAMP_FULL_NAME,
            WellKnown::Duration => DURATION_FULL_NAME,
        }
    }
}

/// Convert a snake_case field name to the lowerCamelCase JSON name.
///
/// - `"first_name"` → `"firstName"`
/// - `"string_"` → `"string"`
pub fn to_json_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Join a package and a relative name into a fully-qualified name.
///
/// - `("example", "User")` → `"example.User"`
/// - `("", "User")` → `"User"`
pub fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_name_mapping() {
        assert_eq!(Kind::from_scalar_name("int32"), Some(Kind::Int32));
        assert_eq!(Kind::from_scalar_name("sfixed64"), Some(Kind::Sfixed64));
        assert_eq!(Kind::from_scalar_name("bytes"), Some(Kind::Bytes));
        assert_eq!(Kind::from_scalar_name("example.User"), None);
        assert_eq!(Kind::from_scalar_name("message"), None);
    }

    #[test]
    fn scalar_names_round_trip() {
        for name in ["bool", "sint32", "fixed32", "uint64", "double", "string"] {
            let kind = Kind::from_scalar_name(name).unwrap();
            assert_eq!(kind.name(), name);
        }
    }

    #[test]
    fn map_key_kinds() {
        assert!(Kind::String.is_map_key());
        assert!(Kind::Fixed64.is_map_key());
        assert!(Kind::Bool.is_map_key());
        assert!(!Kind::Float.is_map_key());
        assert!(!Kind::Enum.is_map_key());
        assert!(!Kind::Message.is_map_key());
    }

    #[test]
    fn well_known_names() {
        assert_eq!(
            WellKnown::from_full_name("google.protobuf.Timestamp"),
            Some(WellKnown::Timestamp)
        );
        assert_eq!(
            WellKnown::from_full_name(".google.protobuf.Duration"),
            Some(WellKnown::Duration)
        );
        assert_eq!(WellKnown::from_full_name("google.protobuf.Any"), None);
    }

    #[test]
    fn json_name_conversion() {
        assert_eq!(to_json_name("first_name"), "firstName");
        assert_eq!(to_json_name("user"), "user");
        assert_eq!(to_json_name("default_ts"), "defaultTs");
        assert_eq!(to_json_name("string_"), "string");
    }

    #[test]
    fn qualify_names() {
        assert_eq!(qualify("example", "User"), "example.User");
        assert_eq!(qualify("", "User"), "User");
    }
}
