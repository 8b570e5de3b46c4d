//! Prompt templates with named slots
//!
//! A template is parsed once into literal text and `{slot}` placeholders.
//! `{{` and `}}` produce literal braces. Slots can be filled ahead of time
//! with `partial`, which is how fixed instructions are baked in when an
//! agent is built; `format` then only substitutes the per-call slots.

use std::collections::BTreeSet;

use thiserror::Error;

/// Errors raised while parsing or rendering a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),

    #[error("Invalid slot name: '{0}'")]
    InvalidSlot(String),

    #[error("Template has no slot named '{0}'")]
    UnknownSlot(String),

    #[error("No value supplied for slot '{0}'")]
    MissingValue(String),

    #[error("Template slots {found:?} do not match expected {expected:?}")]
    SlotMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// An immutable template with named substitution slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template
    pub fn new(text: &str) -> Result<Self, PromptError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(PromptError::UnbalancedBrace(pos));
                    }
                    if !is_slot_name(&name) {
                        return Err(PromptError::InvalidSlot(name));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(name));
                }
                '}' => return Err(PromptError::UnbalancedBrace(pos)),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Names of the slots still open, sorted
    pub fn slots(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Fill one slot permanently
    ///
    /// The value is inserted verbatim; braces inside it are not parsed.
    pub fn partial(mut self, name: &str, value: &str) -> Result<Self, PromptError> {
        if !self.slots().contains(name) {
            return Err(PromptError::UnknownSlot(name.to_string()));
        }

        for segment in &mut self.segments {
            if matches!(segment, Segment::Slot(slot) if slot.as_str() == name) {
                *segment = Segment::Literal(value.to_string());
            }
        }

        Ok(self)
    }

    /// Check that exactly `expected` remain open
    pub fn require_slots(&self, expected: &[&str]) -> Result<(), PromptError> {
        let found = self.slots();
        let wanted: BTreeSet<&str> = expected.iter().copied().collect();

        if found != wanted {
            return Err(PromptError::SlotMismatch {
                expected: wanted.into_iter().map(String::from).collect(),
                found: found.into_iter().map(String::from).collect(),
            });
        }
        Ok(())
    }

    /// Render with a value for every open slot
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, PromptError> {
        let slots = self.slots();
        if let Some((name, _)) = values.iter().find(|(name, _)| !slots.contains(name)) {
            return Err(PromptError::UnknownSlot(name.to_string()));
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = values
                        .iter()
                        .find(|(n, _)| *n == name.as_str())
                        .map(|(_, v)| *v)
                        .ok_or_else(|| PromptError::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_slot_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
