//! Compiled step patterns
//!
//! A pattern is literal text with typed placeholders:
//!
//! | placeholder | matches                        | yields  |
//! |-------------|--------------------------------|---------|
//! | `{name}`    | any non-empty text             | `Str`   |
//! | `{name:d}`  | a signed integer               | `Int`   |
//! | `{name:f}`  | a decimal number               | `Float` |
//! | `{name:w}`  | letters, digits and `_`        | `Str`   |
//!
//! `{{` and `}}` stand for literal braces. A pattern matches a step only if
//! it covers the whole text.

use crate::check::{CheckResult, Failure};
use crate::common::{Error, Result};
use crate::value::Param;

/// Type of a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Text,
    Int,
    Float,
    Word,
}

impl Placeholder {
    fn from_spec(spec: &str) -> Option<Self> {
        match spec {
            "" => Some(Placeholder::Text),
            "d" => Some(Placeholder::Int),
            "f" => Some(Placeholder::Float),
            "w" => Some(Placeholder::Word),
            _ => None,
        }
    }

    fn parse(self, span: &str) -> Option<Param> {
        if span.is_empty() {
            return None;
        }
        match self {
            Placeholder::Text => Some(Param::Str(span.to_string())),
            Placeholder::Int => span.parse::<i64>().ok().map(Param::Int),
            Placeholder::Float => {
                if !span.bytes().any(|b| b.is_ascii_digit()) {
                    return None;
                }
                span.parse::<f64>().ok().map(Param::Float)
            }
            Placeholder::Word => span
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
                .then(|| Param::Str(span.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Capture { name: String, kind: Placeholder },
}

/// A step pattern compiled into literal segments and capture slots
#[derive(Debug, Clone)]
pub struct StepPattern {
    source: String,
    segments: Vec<Segment>,
}

impl StepPattern {
    pub fn compile(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(Error::invalid_pattern(source, "unmatched '}'")),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(Error::invalid_pattern(source, "unclosed '{'"));
                    }

                    let (name, spec) = body.split_once(':').unwrap_or((body.as_str(), ""));
                    let name = name.trim();
                    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                        return Err(Error::invalid_pattern(
                            source,
                            &format!("bad placeholder name '{name}'"),
                        ));
                    }
                    let kind = Placeholder::from_spec(spec.trim()).ok_or_else(|| {
                        Error::invalid_pattern(source, &format!("unknown placeholder type '{spec}'"))
                    })?;

                    if literal.is_empty() {
                        if let Some(Segment::Capture { .. }) = segments.last() {
                            return Err(Error::invalid_pattern(
                                source,
                                "placeholders must be separated by literal text",
                            ));
                        }
                    } else {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }

                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Capture { name: n, .. } if n == name));
                    if duplicate {
                        return Err(Error::invalid_pattern(
                            source,
                            &format!("placeholder '{name}' appears twice"),
                        ));
                    }
                    segments.push(Segment::Capture {
                        name: name.to_string(),
                        kind,
                    });
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern has no placeholders
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Match the whole of `text`, returning the captured arguments
    pub fn matches(&self, text: &str) -> Option<StepArgs> {
        let mut args = StepArgs::default();
        if self.match_from(0, text, 0, &mut args) {
            Some(args)
        } else {
            None
        }
    }

    fn match_from(&self, index: usize, text: &str, pos: usize, args: &mut StepArgs) -> bool {
        let Some(segment) = self.segments.get(index) else {
            return pos == text.len();
        };
        let rest = &text[pos..];

        match segment {
            Segment::Literal(literal) => {
                rest.starts_with(literal.as_str())
                    && self.match_from(index + 1, text, pos + literal.len(), args)
            }
            Segment::Capture { name, kind } => match self.segments.get(index + 1) {
                None => match kind.parse(rest) {
                    Some(value) => {
                        args.values.push((name.clone(), value));
                        true
                    }
                    None => false,
                },
                Some(Segment::Literal(anchor)) => {
                    // Every boundary, so overlapping anchor hits are tried too.
                    for (offset, _) in rest.char_indices().skip(1) {
                        if !rest[offset..].starts_with(anchor.as_str()) {
                            continue;
                        }
                        let Some(value) = kind.parse(&rest[..offset]) else {
                            continue;
                        };
                        args.values.push((name.clone(), value));
                        if self.match_from(index + 1, text, pos + offset, args) {
                            return true;
                        }
                        args.values.pop();
                    }
                    false
                }
                // Adjacent captures are rejected at compile time.
                Some(Segment::Capture { .. }) => false,
            },
        }
    }
}

/// Arguments captured from a step's text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepArgs {
    values: Vec<(String, Param)>,
}

impl StepArgs {
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    fn require(&self, name: &str) -> CheckResult<&Param> {
        self.get(name)
            .ok_or_else(|| Failure::error(format!("step has no argument '{name}'")))
    }

    /// Integer argument from a `{name:d}` placeholder
    pub fn int(&self, name: &str) -> CheckResult<i64> {
        let param = self.require(name)?;
        param
            .as_int()
            .ok_or_else(|| Failure::error(format!("step argument '{name}' is not an integer")))
    }

    /// Float argument
    pub fn float(&self, name: &str) -> CheckResult<f64> {
        let param = self.require(name)?;
        param
            .as_float()
            .ok_or_else(|| Failure::error(format!("step argument '{name}' is not a number")))
    }

    /// Text argument
    pub fn string(&self, name: &str) -> CheckResult<&str> {
        let param = self.require(name)?;
        param
            .as_str()
            .ok_or_else(|| Failure::error(format!("step argument '{name}' is not text")))
    }
}
