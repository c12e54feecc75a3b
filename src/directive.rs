//! Per-field directives that steer how a field is populated.
//!
//! A schema attaches a [`DirectiveSpec`] to a field under the `"generate"`
//! key. When the schema is compiled each raw directive is validated once and
//! turned into a [`Directive`], which the engine then consults on every
//! population call.
//!
//! ```json
//! {
//!   "name": "hobbies",
//!   "type": "string",
//!   "repeated": true,
//!   "generate": {
//!     "repeated": { "range": { "min": 1, "max": 3 }, "element": { "tag": "{hobby}" } }
//!   }
//! }
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};

/// Where a field's string value comes from before it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A generator grammar string, e.g. `"{firstname} ###"`.
    Tag(String),
    /// A template evaluated with the configured template context.
    Template(String),
}

/// Explicit container size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// Exactly this many elements or entries.
    Len(u32),
    /// Uniformly chosen from the inclusive range.
    Range { min: u32, max: u32 },
}

/// Overrides for repeated fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDirective {
    pub size: Option<Size>,
    /// Replaces the field's directive for every element.
    pub element: Option<Box<Directive>>,
}

/// Overrides for map fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDirective {
    pub size: Option<Size>,
    pub key: Option<Box<Directive>>,
    /// Falls back to the map field's own directive when absent.
    pub value: Option<Box<Directive>>,
}

/// Resolved configuration for a single field.
///
/// A directive without a source and with `skip == false` asks the engine to
/// synthesize a random value directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directive {
    pub skip: bool,
    pub source: Option<Source>,
    pub list: Option<ListDirective>,
    pub map: Option<MapDirective>,
}

impl Directive {
    /// The directive used for fields that carry none.
    pub const EMPTY: Directive = Directive {
        skip: false,
        source: None,
        list: None,
        map: None,
    };

    pub fn skip() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            source: Some(Source::Tag(tag.into())),
            ..Self::default()
        }
    }

    pub fn template(template: impl Into<String>) -> Self {
        Self {
            source: Some(Source::Template(template.into())),
            ..Self::default()
        }
    }

    pub fn with_list(mut self, list: ListDirective) -> Self {
        self.list = Some(list);
        self
    }

    pub fn with_map(mut self, map: MapDirective) -> Self {
        self.map = Some(map);
        self
    }

    /// Explicit size override for a repeated field, if any.
    pub fn list_size(&self) -> Option<Size> {
        self.list.as_ref().and_then(|l| l.size)
    }

    /// Explicit size override for a map field, if any.
    pub fn map_size(&self) -> Option<Size> {
        self.map.as_ref().and_then(|m| m.size)
    }

    pub fn element(&self) -> Option<&Directive> {
        self.list.as_ref().and_then(|l| l.element.as_deref())
    }

    pub fn map_key(&self) -> Option<&Directive> {
        self.map.as_ref().and_then(|m| m.key.as_deref())
    }

    pub fn map_value(&self) -> Option<&Directive> {
        self.map.as_ref().and_then(|m| m.value.as_deref())
    }
}

/// Serialized form of a directive as it appears in a schema file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectiveSpec {
    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub template: Option<String>,

    /// Overrides for repeated fields.
    #[serde(default)]
    pub repeated: Option<ListSpec>,

    /// Overrides for map fields.
    #[serde(default)]
    pub map: Option<MapSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSpec {
    #[serde(default)]
    pub len: Option<u32>,
    #[serde(default)]
    pub range: Option<RangeSpec>,
    #[serde(default)]
    pub element: Option<Box<DirectiveSpec>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapSpec {
    #[serde(default)]
    pub len: Option<u32>,
    #[serde(default)]
    pub range: Option<RangeSpec>,
    #[serde(default)]
    pub key: Option<Box<DirectiveSpec>>,
    #[serde(default)]
    pub value: Option<Box<DirectiveSpec>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSpec {
    pub min: u32,
    pub max: u32,
}

impl DirectiveSpec {
    /// Validate the raw directive and produce a [`Directive`].
    ///
    /// `field` names the owning field in error messages.
    pub fn resolve(&self, field: &str) -> Result<Directive> {
        let source = match (&self.tag, &self.template) {
            (Some(_), Some(_)) => {
                return Err(invalid(field, "tag and template are mutually exclusive"));
            }
            (Some(tag), None) => Some(Source::Tag(tag.clone())),
            (None, Some(template)) => Some(Source::Template(template.clone())),
            (None, None) => None,
        };

        let list = match &self.repeated {
            Some(spec) => Some(ListDirective {
                size: resolve_size(field, spec.len, spec.range)?,
                element: resolve_nested(field, "element", spec.element.as_deref())?,
            }),
            None => None,
        };

        let map = match &self.map {
            Some(spec) => Some(MapDirective {
                size: resolve_size(field, spec.len, spec.range)?,
                key: resolve_nested(field, "key", spec.key.as_deref())?,
                value: resolve_nested(field, "value", spec.value.as_deref())?,
            }),
            None => None,
        };

        Ok(Directive {
            skip: self.skip,
            source,
            list,
            map,
        })
    }
}

fn resolve_size(field: &str, len: Option<u32>, range: Option<RangeSpec>) -> Result<Option<Size>> {
    match (len, range) {
        (Some(_), Some(_)) => Err(invalid(field, "len and range are mutually exclusive")),
        (Some(n), None) => Ok(Some(Size::Len(n))),
        (None, Some(r)) if r.min > r.max => Err(invalid(
            field,
            &format!("range min {} exceeds max {}", r.min, r.max),
        )),
        (None, Some(r)) => Ok(Some(Size::Range {
            min: r.min,
            max: r.max,
        })),
        (None, None) => Ok(None),
    }
}

fn resolve_nested(
    field: &str,
    part: &str,
    spec: Option<&DirectiveSpec>,
) -> Result<Option<Box<Directive>>> {
    spec.map(|s| s.resolve(&format!("{field}.{part}")).map(Box::new))
        .transpose()
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidDirective {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(json: &str) -> DirectiveSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn resolves_tag() {
        let d = spec(r#"{"tag": "{firstname}"}"#).resolve("f").unwrap();
        assert_eq!(d.source, Some(Source::Tag("{firstname}".to_string())));
        assert!(!d.skip);
    }

    #[test]
    fn rejects_tag_and_template() {
        let err = spec(r#"{"tag": "a", "template": "b"}"#)
            .resolve("example.User.name")
            .unwrap_err()
            .to_string();
        assert!(err.contains("example.User.name"));
        assert!(err.contains("mutually exclusive"));
    }

    #[test]
    fn resolves_list_overrides() {
        let d = spec(r#"{"repeated": {"len": 3, "element": {"tag": "bar"}}}"#)
            .resolve("f")
            .unwrap();
        assert_eq!(d.list_size(), Some(Size::Len(3)));
        assert_eq!(d.element(), Some(&Directive::tag("bar")));
        assert_eq!(d.map_size(), None);
    }

    #[test]
    fn resolves_map_overrides() {
        let d = spec(
            r#"{"map": {"range": {"min": 1, "max": 2}, "key": {"skip": true}, "value": {"template": "x"}}}"#,
        )
        .resolve("f")
        .unwrap();
        assert_eq!(d.map_size(), Some(Size::Range { min: 1, max: 2 }));
        assert_eq!(d.map_key(), Some(&Directive::skip()));
        assert_eq!(d.map_value(), Some(&Directive::template("x")));
    }

    #[test]
    fn rejects_len_and_range() {
        let err = spec(r#"{"repeated": {"len": 3, "range": {"min": 1, "max": 2}}}"#)
            .resolve("f")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDirective { .. }));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = spec(r#"{"map": {"range": {"min": 5, "max": 2}}}"#)
            .resolve("f")
            .unwrap_err()
            .to_string();
        assert!(err.contains("min 5 exceeds max 2"));
    }

    #[test]
    fn nested_errors_name_the_part() {
        let err = spec(r#"{"map": {"key": {"tag": "a", "template": "b"}}}"#)
            .resolve("pets")
            .unwrap_err()
            .to_string();
        assert!(err.contains("pets.key"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(serde_json::from_str::<DirectiveSpec>(r#"{"tags": "x"}"#).is_err());
    }

    #[test]
    fn empty_directive_is_default() {
        assert_eq!(Directive::EMPTY, Directive::default());
        assert_eq!(DirectiveSpec::default().resolve("f").unwrap(), Directive::EMPTY);
    }
}
