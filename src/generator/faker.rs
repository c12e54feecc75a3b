//! The default [`Generator`], backed by a [`rand`] RNG.
//!
//! # Tag grammar
//!
//! | Token | Expands to |
//! |-------|------------|
//! | `#` | a random digit |
//! | `?` | a random ASCII letter |
//! | `{name}` | the named function, e.g. `{firstname}` |
//! | `{name:a,b}` | the named function with arguments, e.g. `{number:1,6}` |
//! | anything else | itself |

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::functions::{self, finite_f32, finite_f64, random_letter, random_timestamp};
use super::template::{self, TemplateContext};
use super::Generator;
use crate::error::{Error, Result};

/// A seedable fake-data generator.
///
/// Two fakers built with the same seed produce identical sequences. A faker
/// is not synchronized; give each thread its own.
#[derive(Debug, Clone)]
pub struct Faker<R = StdRng> {
    rng: R,
}

impl Faker<StdRng> {
    /// A deterministic faker.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A faker seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> Faker<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    fn expand(&mut self, grammar: &str) -> Result<String> {
        let mut out = String::with_capacity(grammar.len());
        let mut chars = grammar.char_indices();
        while let Some((start, c)) = chars.next() {
            match c {
                '#' => out.push(char::from(b'0' + self.rng.random_range(0..10u8))),
                '?' => out.push(random_letter(&mut self.rng)),
                '{' => {
                    let body_start = start + 1;
                    let Some(len) = grammar[body_start..].find('}') else {
                        return Err(Error::Grammar {
                            input: grammar.to_string(),
                            reason: format!("unclosed '{{' at offset {start}"),
                        });
                    };
                    let body = &grammar[body_start..body_start + len];
                    out.push_str(&self.call(body)?);
                    // Skip past the closing brace.
                    for _ in 0..=body.chars().count() {
                        chars.next();
                    }
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }

    fn call(&mut self, body: &str) -> Result<String> {
        let (name, args) = match body.split_once(':') {
            Some((name, args)) => (name.trim(), args.split(',').map(str::to_string).collect()),
            None => (body.trim(), Vec::new()),
        };
        functions::call(&mut self.rng, name, &args)
            .unwrap_or_else(|| Err(Error::UnknownFunction(name.to_string())))
    }
}

impl<R: Rng> Generator for Faker<R> {
    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    fn int32(&mut self) -> i32 {
        self.rng.random()
    }

    fn uint32(&mut self) -> u32 {
        self.rng.random()
    }

    fn int64(&mut self) -> i64 {
        self.rng.random()
    }

    fn uint64(&mut self) -> u64 {
        self.rng.random()
    }

    fn float32(&mut self) -> f32 {
        finite_f32(&mut self.rng)
    }

    fn float64(&mut self) -> f64 {
        finite_f64(&mut self.rng)
    }

    fn letters(&mut self, len: usize) -> String {
        (0..len).map(|_| random_letter(&mut self.rng)).collect()
    }

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.rng.fill(buf.as_mut_slice());
        buf
    }

    fn timestamp(&mut self) -> DateTime<Utc> {
        random_timestamp(&mut self.rng)
    }

    fn duration(&mut self) -> TimeDelta {
        TimeDelta::nanoseconds(self.rng.random())
    }

    fn generate(&mut self, grammar: &str) -> Result<String> {
        self.expand(grammar)
    }

    fn template(&mut self, template: &str, context: Option<&TemplateContext>) -> Result<String> {
        template::render(&mut self.rng, template, context)
    }
}
