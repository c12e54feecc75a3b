//! The recursive population engine.
//!
//! [`ProtoFaker`] walks a message's fields, consults each field's
//! [`Directive`], and writes generated values back into the message:
//!
//! 1. every union group picks one member uniformly, or none;
//! 2. every other field is populated on its own;
//! 3. nested messages recurse one level deeper, until `max_depth` is reached
//!    and the field is left unset.
//!
//! Depth is the only termination guard. Self-referential and mutually
//! recursive schemas are never cycle-detected.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta};
use tracing::{debug, trace};

use crate::config::{Config, SizeRange};
use crate::directive::{Directive, Size, Source};
use crate::dynamic::DynamicMessage;
use crate::error::{Error, Result};
use crate::generator::{Faker, Generator};
use crate::kind::{Kind, WellKnown};
use crate::parse::parse_value;
use crate::reflect::{FieldInfo, OneofGroup, ReflectMessage, Value};
use crate::schema::Registry;

/// Populates messages with fake data.
///
/// The configuration is fixed at construction. The generator is the only
/// mutable state, so one `ProtoFaker` must not be shared across threads
/// unless its generator synchronizes internally.
#[derive(Debug, Clone)]
pub struct ProtoFaker<G> {
    generator: G,
    config: Config,
}

impl ProtoFaker<Faker> {
    /// A deterministic faker with the default configuration.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Faker::seeded(seed))
    }
}

impl<G: Generator> ProtoFaker<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            config: Config::default(),
        }
    }

    /// Use `config` instead of the defaults. The configuration is validated.
    pub fn with_config(generator: G, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { generator, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    pub fn into_inner(self) -> G {
        self.generator
    }

    /// Populate `msg` according to its schema and directives.
    ///
    /// Fails only when a tag or template cannot be generated or parsed. Depth
    /// and size limits silently leave fields unset or containers empty. On
    /// error `msg` may be partially populated.
    pub fn fake_into<M: ReflectMessage>(&mut self, msg: &mut M) -> Result<()> {
        self.populate(0, msg)
    }

    /// Create and populate a message of the named type.
    pub fn fake_message(&mut self, registry: &Arc<Registry>, name: &str) -> Result<DynamicMessage> {
        let mut msg = DynamicMessage::new(registry, name)?;
        self.fake_into(&mut msg)?;
        Ok(msg)
    }

    // ── Messages ──

    fn populate<M: ReflectMessage>(&mut self, depth: usize, msg: &mut M) -> Result<()> {
        trace!(message = msg.full_name(), depth, "populating message");
        for oneof in msg.oneofs() {
            self.populate_oneof(depth, msg, &oneof)?;
        }
        for field in msg.fields() {
            if field.containing_oneof().is_some() {
                continue;
            }
            self.populate_field(depth, msg, &field)?;
        }
        Ok(())
    }

    /// Draws from `[-1, k-1]`: `-1` leaves the group unset, clearing any
    /// member already set.
    fn populate_oneof<M: ReflectMessage>(
        &mut self,
        depth: usize,
        msg: &mut M,
        oneof: &OneofGroup<M::Field>,
    ) -> Result<()> {
        let choice = self.generator.int_range(-1, oneof.fields.len() as i64 - 1);
        match usize::try_from(choice).ok().and_then(|i| oneof.fields.get(i)) {
            Some(field) => {
                debug!(oneof = %oneof.name, field = field.name(), "selected oneof member");
                self.populate_field(depth, msg, field)
            }
            None => {
                debug!(oneof = %oneof.name, "leaving oneof unset");
                if let Some(set) = msg.which_oneof(&oneof.name) {
                    msg.clear(&set);
                }
                Ok(())
            }
        }
    }

    fn populate_field<M: ReflectMessage>(
        &mut self,
        depth: usize,
        msg: &mut M,
        field: &M::Field,
    ) -> Result<()> {
        let directive = field.directive().unwrap_or(&Directive::EMPTY);
        if directive.skip {
            return Ok(());
        }
        if field.is_map() {
            return self.populate_map(depth, msg, field, directive);
        }
        if field.is_list() {
            return self.populate_list(depth, msg, field, directive);
        }
        if let Some(value) = self.resolve_value(depth, msg, directive, field)? {
            msg.set(field, value)?;
        }
        Ok(())
    }

    /// Resolve one singular value, list element or map value.
    ///
    /// `None` means the value is left out: a nested message at the depth
    /// bound. A skipped item resolves to its zero value.
    fn resolve_value<M: ReflectMessage>(
        &mut self,
        depth: usize,
        msg: &M,
        directive: &Directive,
        field: &M::Field,
    ) -> Result<Option<Value<M>>> {
        if directive.skip {
            return self.zero_value(msg, field).map(Some);
        }
        if !field.kind().is_message() || field.well_known().is_some() {
            return self.resolve_scalar::<M>(field, directive).map(Some);
        }
        if depth + 1 >= self.config.max_depth {
            trace!(field = field.full_name(), depth, "depth bound reached");
            return Ok(None);
        }
        let mut nested = msg.new_message(field)?;
        self.populate(depth + 1, &mut nested)?;
        Ok(Some(Value::Message(nested)))
    }

    // ── Containers ──

    fn populate_map<M: ReflectMessage>(
        &mut self,
        depth: usize,
        msg: &mut M,
        field: &M::Field,
        directive: &Directive,
    ) -> Result<()> {
        msg.clear(field);
        let len = self.container_len(directive.map_size(), self.config.map_size);
        trace!(field = field.full_name(), len, "populating map");
        if len == 0 {
            return Ok(());
        }

        let (Some(key_field), Some(value_field)) = (field.map_key(), field.map_value()) else {
            return Err(Error::Schema(format!(
                "map field '{}' has no key or value descriptor",
                field.full_name()
            )));
        };
        let key_directive = directive.map_key().unwrap_or(&Directive::EMPTY);
        let value_directive = directive.map_value().unwrap_or(directive);

        for _ in 0..len {
            let key = if key_directive.skip {
                self.zero_value(msg, key_field)?
            } else {
                self.resolve_scalar::<M>(key_field, key_directive)?
            };
            if let Some(value) = self.resolve_value(depth, msg, value_directive, value_field)? {
                msg.insert(field, key, value)?;
            }
        }
        Ok(())
    }

    fn populate_list<M: ReflectMessage>(
        &mut self,
        depth: usize,
        msg: &mut M,
        field: &M::Field,
        directive: &Directive,
    ) -> Result<()> {
        msg.clear(field);
        let len = self.container_len(directive.list_size(), self.config.list_size);
        trace!(field = field.full_name(), len, "populating list");
        if len == 0 {
            return Ok(());
        }

        let element_directive = directive.element().unwrap_or(directive);
        for _ in 0..len {
            if let Some(value) = self.resolve_value(depth, msg, element_directive, field)? {
                msg.push(field, value)?;
            }
        }
        Ok(())
    }

    fn container_len(&mut self, size: Option<Size>, default: SizeRange) -> usize {
        match size {
            Some(Size::Len(n)) => n as usize,
            Some(Size::Range { min, max }) => self.draw_len(min as usize, max as usize),
            None => self.draw_len(default.min, default.max),
        }
    }

    fn draw_len(&mut self, min: usize, max: usize) -> usize {
        let n = self.generator.int_range(min as i64, max as i64);
        usize::try_from(n).unwrap_or(0)
    }

    // ── Scalars ──

    fn resolve_scalar<M: ReflectMessage>(
        &mut self,
        field: &M::Field,
        directive: &Directive,
    ) -> Result<Value<M>> {
        let generated = match &directive.source {
            Some(Source::Tag(tag)) if !tag.is_empty() => self.generator.generate(tag)?,
            Some(Source::Template(template)) if !template.is_empty() => self
                .generator
                .template(template, self.config.template.as_ref())?,
            _ => return self.synthesize::<M>(field),
        };
        parse_value(field, &generated, &self.config.time_format)
    }

    /// A random value of the field's kind, without a string intermediate.
    fn synthesize<M: ReflectMessage>(&mut self, field: &M::Field) -> Result<Value<M>> {
        if let Some(wkt) = field.well_known() {
            return Ok(match wkt {
                WellKnown::Timestamp => Value::Timestamp(self.generator.timestamp()),
                WellKnown::Duration => Value::Duration(self.generator.duration()),
            });
        }

        let value = match field.kind() {
            Kind::Bool => Value::Bool(self.generator.boolean()),
            Kind::Enum => {
                let numbers = field.enum_numbers();
                if numbers.is_empty() {
                    return Err(Error::Schema(format!(
                        "enum field '{}' has no declared values",
                        field.full_name()
                    )));
                }
                let i = self.draw_len(0, numbers.len() - 1);
                Value::Enum(numbers[i.min(numbers.len() - 1)])
            }
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(self.generator.int32()),
            Kind::Uint32 | Kind::Fixed32 => Value::U32(self.generator.uint32()),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(self.generator.int64()),
            Kind::Uint64 | Kind::Fixed64 => Value::U64(self.generator.uint64()),
            Kind::Float => Value::F32(self.generator.float32()),
            Kind::Double => Value::F64(self.generator.float64()),
            Kind::String => {
                let range = self.config.string_size;
                let len = self.draw_len(range.min, range.max);
                Value::String(self.generator.letters(len))
            }
            Kind::Bytes => {
                let range = self.config.bytes_size;
                let len = self.draw_len(range.min, range.max);
                Value::Bytes(self.generator.bytes(len))
            }
            kind @ (Kind::Message | Kind::Group) => {
                return Err(Error::UnexpectedKind {
                    field: field.full_name().to_string(),
                    kind: kind.to_string(),
                });
            }
        };
        Ok(value)
    }

    /// The value a skipped list element, map key or map value takes.
    fn zero_value<M: ReflectMessage>(&self, msg: &M, field: &M::Field) -> Result<Value<M>> {
        if let Some(wkt) = field.well_known() {
            return Ok(match wkt {
                WellKnown::Timestamp => Value::Timestamp(DateTime::UNIX_EPOCH),
                WellKnown::Duration => Value::Duration(TimeDelta::zero()),
            });
        }
        let value = match field.kind() {
            Kind::Bool => Value::Bool(false),
            Kind::Enum => Value::Enum(field.enum_numbers().first().copied().unwrap_or(0)),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
            Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
            Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
            Kind::Float => Value::F32(0.0),
            Kind::Double => Value::F64(0.0),
            Kind::String => Value::String(String::new()),
            Kind::Bytes => Value::Bytes(Vec::new()),
            Kind::Message | Kind::Group => Value::Message(msg.new_message(field)?),
        };
        Ok(value)
    }
}
