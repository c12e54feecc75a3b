//! The randomness capability consumed by the population engine.
//!
//! The engine never draws random numbers itself. Everything it needs, from a
//! bounded integer to the expansion of a tag grammar or a template, goes
//! through the [`Generator`] trait, so a seeded or scripted implementation
//! makes population fully deterministic.

mod functions;
pub mod faker;
pub mod template;
mod words;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::Result;

pub use faker::Faker;
pub use template::{TemplateContext, TemplateFn};

/// Source of random primitives, formatted strings and template output.
///
/// Implementations hold mutable randomness state; share one across threads
/// only if it synchronizes internally.
pub trait Generator {
    /// Uniform integer in `[min, max]`, inclusive on both ends.
    fn int_range(&mut self, min: i64, max: i64) -> i64;

    fn boolean(&mut self) -> bool;

    fn int32(&mut self) -> i32;

    fn uint32(&mut self) -> u32;

    fn int64(&mut self) -> i64;

    fn uint64(&mut self) -> u64;

    /// Any finite `f32`.
    fn float32(&mut self) -> f32;

    /// Any finite `f64`.
    fn float64(&mut self) -> f64;

    /// A random string of `len` ASCII letters.
    fn letters(&mut self, len: usize) -> String;

    fn bytes(&mut self, len: usize) -> Vec<u8>;

    /// A random point in time.
    fn timestamp(&mut self) -> DateTime<Utc>;

    /// A random duration magnitude.
    fn duration(&mut self) -> TimeDelta;

    /// Expand a tag grammar string.
    fn generate(&mut self, grammar: &str) -> Result<String>;

    /// Evaluate a template with optional custom functions and data.
    fn template(&mut self, template: &str, context: Option<&TemplateContext>) -> Result<String>;
}

impl<G: Generator + ?Sized> Generator for &mut G {
    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        (**self).int_range(min, max)
    }

    fn boolean(&mut self) -> bool {
        (**self).boolean()
    }

    fn int32(&mut self) -> i32 {
        (**self).int32()
    }

    fn uint32(&mut self) -> u32 {
        (**self).uint32()
    }

    fn int64(&mut self) -> i64 {
        (**self).int64()
    }

    fn uint64(&mut self) -> u64 {
        (**self).uint64()
    }

    fn float32(&mut self) -> f32 {
        (**self).float32()
    }

    fn float64(&mut self) -> f64 {
        (**self).float64()
    }

    fn letters(&mut self, len: usize) -> String {
        (**self).letters(len)
    }

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        (**self).bytes(len)
    }

    fn timestamp(&mut self) -> DateTime<Utc> {
        (**self).timestamp()
    }

    fn duration(&mut self) -> TimeDelta {
        (**self).duration()
    }

    fn generate(&mut self, grammar: &str) -> Result<String> {
        (**self).generate(grammar)
    }

    fn template(&mut self, template: &str, context: Option<&TemplateContext>) -> Result<String> {
        (**self).template(template, context)
    }
}
