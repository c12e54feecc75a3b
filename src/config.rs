//! Engine configuration.
//!
//! A [`Config`] is built once, either in code with the `with_*` methods or from
//! a TOML file, and then shared by every population call of a
//! [`ProtoFaker`](crate::engine::ProtoFaker).
//!
//! ```toml
//! max_depth = 3
//! string_size = { min = 8, max = 12 }
//! list_size = { min = 0, max = 2 }
//! time_format = "%b %d %Y %H:%M:%S"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::generator::TemplateContext;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_MIN_SIZE: usize = 4;
pub const DEFAULT_MAX_SIZE: usize = 10;

/// RFC 3339 with optional fractional seconds. Parsing with this format accepts
/// any RFC 3339 timestamp, including a `Z` suffix.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Inclusive length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
}

impl SizeRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn fixed(len: usize) -> Self {
        Self { min: len, max: len }
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SIZE, DEFAULT_MAX_SIZE)
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// Parses `"4..10"`, `"4-10"` or a single length `"3"`.
impl FromStr for SizeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| Error::Config(format!("invalid size {s:?}: {e}")))
        };
        let range = match s.split_once("..").or_else(|| s.split_once('-')) {
            Some((min, max)) => SizeRange::new(parse(min)?, parse(max)?),
            None => SizeRange::fixed(parse(s)?),
        };
        if range.min > range.max {
            return Err(Error::Config(format!(
                "invalid size {s:?}: min exceeds max"
            )));
        }
        Ok(range)
    }
}

/// Immutable settings shared by population calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Nested messages at this depth or deeper are left unset.
    pub max_depth: usize,

    /// Length of synthesized strings.
    pub string_size: SizeRange,

    /// Length of synthesized byte sequences.
    pub bytes_size: SizeRange,

    /// Element count of repeated fields without an override.
    pub list_size: SizeRange,

    /// Entry count of map fields without an override.
    pub map_size: SizeRange,

    /// `strftime` format used to parse tag and template output into
    /// timestamps.
    pub time_format: String,

    /// Custom functions and data for templates.
    #[serde(skip)]
    pub template: Option<TemplateContext>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            string_size: SizeRange::default(),
            bytes_size: SizeRange::default(),
            list_size: SizeRange::default(),
            map_size: SizeRange::default(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            template: None,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_string_size(mut self, min: usize, max: usize) -> Self {
        self.string_size = SizeRange::new(min, max);
        self
    }

    pub fn with_bytes_size(mut self, min: usize, max: usize) -> Self {
        self.bytes_size = SizeRange::new(min, max);
        self
    }

    pub fn with_list_size(mut self, min: usize, max: usize) -> Self {
        self.list_size = SizeRange::new(min, max);
        self
    }

    pub fn with_map_size(mut self, min: usize, max: usize) -> Self {
        self.map_size = SizeRange::new(min, max);
        self
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    pub fn with_template_context(mut self, context: TemplateContext) -> Self {
        self.template = Some(context);
        self
    }

    /// Check that every range is ordered and the depth bound is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        for (name, range) in [
            ("string_size", self.string_size),
            ("bytes_size", self.bytes_size),
            ("list_size", self.list_size),
            ("map_size", self.map_size),
        ] {
            if range.min > range.max {
                return Err(Error::Config(format!(
                    "{name}: min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }
        if self.time_format.is_empty() {
            return Err(Error::Config("time_format must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.string_size, SizeRange::new(4, 10));
        assert_eq!(config.map_size, SizeRange::new(4, 10));
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert!(config.template.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn builder_methods() {
        let config = Config::default()
            .with_max_depth(2)
            .with_list_size(0, 0)
            .with_bytes_size(12, 12)
            .with_time_format("%Y");
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.list_size, SizeRange::fixed(0));
        assert_eq!(config.bytes_size, SizeRange::fixed(12));
        assert_eq!(config.time_format, "%Y");
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let err = Config::default().with_map_size(5, 1).validate().unwrap_err();
        assert!(err.to_string().contains("map_size"));
    }

    #[test]
    fn validate_rejects_zero_depth() {
        assert!(Config::default().with_max_depth(0).validate().is_err());
    }

    #[test]
    fn parse_size_ranges() {
        assert_eq!("4..10".parse::<SizeRange>().unwrap(), SizeRange::new(4, 10));
        assert_eq!("1-2".parse::<SizeRange>().unwrap(), SizeRange::new(1, 2));
        assert_eq!("3".parse::<SizeRange>().unwrap(), SizeRange::fixed(3));
        assert!("5..1".parse::<SizeRange>().is_err());
        assert!("a..b".parse::<SizeRange>().is_err());
    }

    #[test]
    fn size_range_display() {
        assert_eq!(SizeRange::new(4, 10).to_string(), "4..10");
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = Config::from_toml_str(
            r#"
            max_depth = 3
            list_size = { min = 1, max = 2 }
            "#,
        )
        .unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.list_size, SizeRange::new(1, 2));
        assert_eq!(config.string_size, SizeRange::default());
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        assert!(matches!(
            Config::from_toml_str("max_dept = 3").unwrap_err(),
            Error::Toml(_)
        ));
    }

    #[test]
    fn toml_is_validated() {
        assert!(matches!(
            Config::from_toml_str("max_depth = 0").unwrap_err(),
            Error::Config(_)
        ));
    }
}
