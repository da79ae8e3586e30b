//! Positional access to configuration documents
//!
//! Documents are parsed with `jsonc-parser`, which accepts the `//` and
//! `/* */` comments and trailing commas sing-box tolerates. Lookups walk the
//! AST; edits splice new text into the original source at the target value's
//! byte range, so everything outside that value stays as the user wrote it.

use std::ops::Range;

use jsonc_parser::ast;
use jsonc_parser::{parse_to_ast, CollectOptions, ParseOptions};

use crate::constants::document::{BYTE_ORDER_MARK, PATH_SEPARATOR};
use crate::error::AccessError;

/// Coarse type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

/// A value located inside a parsed document
#[derive(Clone, Copy)]
pub struct Value<'d> {
    text: &'d str,
    node: &'d ast::Value<'d>,
}

impl<'d> Value<'d> {
    /// Byte range of the value within the document text
    pub fn span(&self) -> Range<usize> {
        let (start, end) = match self.node {
            ast::Value::StringLit(lit) => (lit.range.start, lit.range.end),
            ast::Value::NumberLit(lit) => (lit.range.start, lit.range.end),
            ast::Value::BooleanLit(lit) => (lit.range.start, lit.range.end),
            ast::Value::Object(obj) => (obj.range.start, obj.range.end),
            ast::Value::Array(arr) => (arr.range.start, arr.range.end),
            ast::Value::NullKeyword(null) => (null.range.start, null.range.end),
        };
        start..end
    }

    /// Source text of the value, exactly as written
    pub fn raw(&self) -> &'d str {
        &self.text[self.span()]
    }

    pub fn kind(&self) -> ValueKind {
        match self.node {
            ast::Value::StringLit(_) => ValueKind::String,
            ast::Value::NumberLit(_) => ValueKind::Number,
            ast::Value::BooleanLit(_) => ValueKind::Bool,
            ast::Value::Object(_) => ValueKind::Object,
            ast::Value::Array(_) => ValueKind::Array,
            ast::Value::NullKeyword(_) => ValueKind::Null,
        }
    }

    pub fn is_object(&self) -> bool {
        self.kind() == ValueKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind() == ValueKind::Array
    }

    /// Object members in document order; empty for non-objects
    pub fn members(&self) -> impl Iterator<Item = (&'d str, Value<'d>)> + use<'d> {
        let text = self.text;
        let properties: &'d [ast::ObjectProp<'d>] = match self.node {
            ast::Value::Object(obj) => &obj.properties,
            _ => &[],
        };
        properties.iter().map(move |prop| {
            let key = match &prop.name {
                ast::ObjectPropName::String(lit) => lit.value.as_ref(),
                ast::ObjectPropName::Word(word) => word.value,
            };
            (key, Value { text, node: &prop.value })
        })
    }

    /// Array elements in index order; empty for non-arrays
    pub fn elements(&self) -> impl Iterator<Item = Value<'d>> + use<'d> {
        let text = self.text;
        let elements: &'d [ast::Value<'d>] = match self.node {
            ast::Value::Array(arr) => &arr.elements,
            _ => &[],
        };
        elements.iter().map(move |node| Value { text, node })
    }

    /// Child by object key (first occurrence) or array index
    pub fn get(&self, segment: &str) -> Option<Value<'d>> {
        match self.kind() {
            ValueKind::Object => self
                .members()
                .find(|(key, _)| *key == segment)
                .map(|(_, value)| value),
            ValueKind::Array => self.elements().nth(parse_index(segment)?),
            _ => None,
        }
    }

    /// Decoded contents when the value is a string
    pub fn as_str(&self) -> Option<&'d str> {
        match self.node {
            ast::Value::StringLit(lit) => Some(lit.value.as_ref()),
            _ => None,
        }
    }

    /// Display text: strings unquoted, everything else as written
    pub fn to_text(&self) -> String {
        match self.as_str() {
            Some(text) => text.to_string(),
            None => self.raw().to_string(),
        }
    }
}

/// A parsed document together with its source text
pub struct Document<'a> {
    bom: &'a str,
    text: &'a str,
    root: ast::Value<'a>,
}

impl<'a> Document<'a> {
    /// Parse `bytes` as JSON with comments and trailing commas.
    ///
    /// Anything else (unbalanced brackets, missing colons, text after the
    /// top-level value, an empty buffer) is a syntax error.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, AccessError> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| AccessError::Syntax(format!("document is not UTF-8: {e}")))?;
        let (bom, text) = match source.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => (&source[..BYTE_ORDER_MARK.len()], rest),
            None => ("", source),
        };

        let options = ParseOptions {
            allow_comments: true,
            allow_trailing_commas: true,
            allow_loose_object_property_names: false,
            ..Default::default()
        };
        let parsed = parse_to_ast(text, &CollectOptions::default(), &options)
            .map_err(|e| AccessError::Syntax(e.to_string()))?;
        let root = parsed
            .value
            .ok_or_else(|| AccessError::Syntax("document is empty".to_string()))?;
        Ok(Self { bom, text, root })
    }

    /// Top-level value
    pub fn root(&self) -> Value<'_> {
        Value {
            text: self.text,
            node: &self.root,
        }
    }

    /// Value at a positional path
    pub fn get(&self, path: &str) -> Result<Value<'_>, AccessError> {
        let segments = split_path(path)?;
        let mut current = self.root();
        for segment in segments {
            current = current.get(segment).ok_or(AccessError::NotFound)?;
        }
        Ok(current)
    }

    /// Replace the value at `path` with `fragment`, byte for byte.
    ///
    /// The fragment is not validated: this is what lets a user paste JSON
    /// carrying comments into a document. Callers that want a quoted value
    /// use [`Document::set_string`].
    pub fn set_raw(&self, path: &str, fragment: &str) -> Result<Vec<u8>, AccessError> {
        let target = self.get(path)?.span();
        let mut out = String::with_capacity(self.bom.len() + self.text.len() - target.len() + fragment.len());
        out.push_str(self.bom);
        out.push_str(&self.text[..target.start]);
        out.push_str(fragment);
        out.push_str(&self.text[target.end..]);
        Ok(out.into_bytes())
    }

    /// Replace the value at `path` with `value` as an escaped JSON string
    pub fn set_string(&self, path: &str, value: &str) -> Result<Vec<u8>, AccessError> {
        let quoted = serde_json::Value::from(value).to_string();
        self.set_raw(path, &quoted)
    }
}

/// Split a positional path into its segments
pub fn split_path(path: &str) -> Result<Vec<&str>, AccessError> {
    if path.is_empty() {
        return Err(AccessError::BadPath("empty path".to_string()));
    }
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(AccessError::BadPath(format!("empty segment in '{path}'")));
    }
    Ok(segments)
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
