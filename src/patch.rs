//! Reading and patching documents through symbolic paths

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::DocumentError;
use crate::resolve::resolve;

/// How a submitted value is written into the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// `{...}` or `[...]`: spliced in as typed, comments and all
    Structured(&'a str),
    /// Anything else: written as a quoted JSON string
    Scalar(&'a str),
}

impl<'a> Fragment<'a> {
    /// Purely lexical check on the trimmed text
    pub fn classify(text: &'a str) -> Self {
        let trimmed = text.trim();
        let structured = (trimmed.starts_with('{') && trimmed.ends_with('}'))
            || (trimmed.starts_with('[') && trimmed.ends_with(']'));
        if structured {
            Fragment::Structured(trimmed)
        } else {
            Fragment::Scalar(text)
        }
    }
}

/// Apply `value` at `path` and return the whole updated document.
///
/// An empty path replaces the document verbatim. Otherwise the path is
/// resolved against `document` as it is now, then:
///
/// * a structured fragment is spliced in without validation. This is the one
///   deliberate escape hatch that lets users keep comments in pasted JSON;
///   the result is not guaranteed to parse as strict JSON.
/// * any other text is written as an escaped JSON string.
///
/// Nothing is returned on failure, so a caller can never persist a half
/// applied edit.
pub fn write(document: &[u8], path: &str, value: &str) -> Result<Vec<u8>, DocumentError> {
    if path.is_empty() {
        return Ok(value.as_bytes().to_vec());
    }

    let resolved = resolve(document, path);
    let result = Document::parse(document).and_then(|doc| match Fragment::classify(value) {
        Fragment::Structured(raw) => {
            debug!(path = %path, resolved = %resolved, "Splicing raw fragment");
            doc.set_raw(&resolved, raw)
        }
        Fragment::Scalar(text) => {
            debug!(path = %path, resolved = %resolved, "Writing string value");
            doc.set_string(&resolved, text)
        }
    });

    result.map_err(|e| {
        let err = DocumentError::from_write(e, path, &resolved);
        warn!(path = %path, resolved = %resolved, error = %err, "Patch failed");
        err
    })
}

/// Text of the value at `path`; the whole document for an empty path.
///
/// Strings come back unquoted, everything else exactly as written.
pub fn read(document: &[u8], path: &str) -> Result<String, DocumentError> {
    if path.is_empty() {
        return Ok(String::from_utf8_lossy(document).into_owned());
    }

    let resolved = resolve(document, path);
    let doc = Document::parse(document).map_err(|e| DocumentError::from_read(e, path, &resolved))?;
    doc.get(&resolved)
        .map(|value| value.to_text())
        .map_err(|e| DocumentError::from_read(e, path, &resolved))
}
