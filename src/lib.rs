//! Populate Protocol Buffer style messages with synthetic data.
//!
//! `proto-faker` walks a message's schema and fills every field with fake
//! data: scalars, enums, nested messages, lists, maps, unions, and the
//! `google.protobuf.Timestamp` / `google.protobuf.Duration` well-known types.
//! Per-field directives attached to the schema steer the output without any
//! per-message code.
//!
//! # Features
//!
//! - Field directives: skip a field, generate it from a tag grammar
//!   (`"{firstname} {lastname}"`, `"###-??"`) or from a template
//!   (`"{{ custom_func }}"`), override list and map sizes
//! - Union groups: at most one member is populated, chosen uniformly
//! - Recursion bounded by depth, so self-referential schemas terminate
//! - Deterministic output from a seeded [`Faker`]
//! - Pluggable message model through [`ReflectMessage`] and pluggable
//!   randomness through [`Generator`]
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use proto_faker::{ProtoFaker, Registry};
//!
//! let registry = Arc::new(Registry::from_path(Path::new("schema.json"))?);
//! let mut faker = ProtoFaker::seeded(3);
//! let user = faker.fake_message(&registry, "example.User")?;
//! println!("{}", serde_json::to_string_pretty(&user.to_json())?);
//! # Ok::<(), proto_faker::error::Error>(())
//! ```

pub mod config;
pub mod directive;
pub mod dynamic;
pub mod engine;
pub mod error;
pub mod generator;
pub mod kind;
pub mod parse;
pub mod reflect;
pub mod schema;

pub use config::{Config, SizeRange};
pub use directive::{Directive, DirectiveSpec, Size, Source};
pub use dynamic::{DynamicMessage, MapKey};
pub use engine::ProtoFaker;
pub use error::{Error, Result};
pub use generator::{Faker, Generator, TemplateContext};
pub use kind::{Kind, WellKnown};
pub use reflect::{FieldInfo, OneofGroup, ReflectMessage, Value};
pub use schema::{Registry, load_schema};
