//! A small text template language for field values.
//!
//! Text is copied verbatim except for `{{ ... }}` actions:
//!
//! - `{{ .user.name }}` looks up a key path in the context's data;
//! - `{{ FirstName }}` calls a function with no arguments;
//! - `{{ Number 1 10 }}` / `{{ greet "Ada Lovelace" .user.name }}` call a
//!   function with bare, quoted or data-reference arguments;
//! - `{{ "literal" }}` prints the literal.
//!
//! Functions registered on the [`TemplateContext`] shadow the built-ins.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde_json::{Map, Value};

use super::functions;
use crate::error::{Error, Result};

/// A custom template function. Receives the evaluated arguments.
pub type TemplateFn = Arc<dyn Fn(&[String]) -> Result<String> + Send + Sync>;

/// Custom functions and data available to templates.
#[derive(Clone, Default)]
pub struct TemplateContext {
    functions: BTreeMap<String, TemplateFn>,
    data: Map<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under `name`.
    pub fn with_function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[String]) -> Result<String> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    /// Add a top-level data entry, reachable as `{{ .key }}`.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn function(&self, name: &str) -> Option<&TemplateFn> {
        self.functions.get(name)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl fmt::Debug for TemplateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateContext")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("data", &self.data)
            .finish()
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Action(&'a str),
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Data(String),
}

/// Evaluate `template` using `rng` for built-in functions.
pub(crate) fn render<R: Rng>(
    rng: &mut R,
    template: &str,
    context: Option<&TemplateContext>,
) -> Result<String> {
    let segments = parse(template)?;
    let mut out = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Action(action) => out.push_str(&eval(rng, action, context)?),
        }
    }
    Ok(out)
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;
    let mut offset = 0;
    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            return Err(Error::Template(format!(
                "unclosed action at offset {}",
                offset + open
            )));
        };
        segments.push(Segment::Action(after[..close].trim()));
        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

fn tokenize(action: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = action.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut literal = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => literal.push('\n'),
                        Some('t') => literal.push('\t'),
                        Some(other) => literal.push(other),
                        None => break,
                    },
                    other => literal.push(other),
                }
            }
            if !closed {
                return Err(Error::Template(format!(
                    "unterminated string in action {action:?}"
                )));
            }
            tokens.push(Token::Quoted(literal));
            continue;
        }
        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            word.push(c);
            chars.next();
        }
        if word.starts_with('.') {
            tokens.push(Token::Data(word));
        } else {
            tokens.push(Token::Word(word));
        }
    }
    Ok(tokens)
}

fn eval<R: Rng>(rng: &mut R, action: &str, context: Option<&TemplateContext>) -> Result<String> {
    let mut tokens = tokenize(action)?.into_iter();
    let Some(head) = tokens.next() else {
        return Err(Error::Template("empty action".to_string()));
    };

    let name = match head {
        Token::Word(name) => name,
        Token::Quoted(literal) if tokens.len() == 0 => return Ok(literal),
        Token::Data(path) if tokens.len() == 0 => return lookup(&path, context),
        _ => {
            return Err(Error::Template(format!(
                "action {action:?} must start with a function name"
            )));
        }
    };

    let args = tokens
        .map(|token| match token {
            Token::Word(w) | Token::Quoted(w) => Ok(w),
            Token::Data(path) => lookup(&path, context),
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(f) = context.and_then(|ctx| ctx.function(&name)) {
        return f(&args);
    }
    functions::call(rng, &name, &args).unwrap_or_else(|| Err(Error::UnknownFunction(name)))
}

fn lookup(path: &str, context: Option<&TemplateContext>) -> Result<String> {
    let missing = || Error::Template(format!("no data for {path}"));
    let data = context.map(TemplateContext::data).ok_or_else(missing)?;

    let mut keys = path.split('.').filter(|k| !k.is_empty());
    let Some(first) = keys.next() else {
        return Ok(Value::Object(data.clone()).to_string());
    };
    let mut value = data.get(first).ok_or_else(missing)?;
    for key in keys {
        value = value.get(key).ok_or_else(missing)?;
    }

    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
