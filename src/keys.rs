//! Navigable key listing for a document

use serde::Serialize;

use crate::constants::document::TAG_FIELD;
use crate::document::{Document, Value};
use crate::error::DocumentError;
use crate::resolve::is_tagged_root;

/// Keys to present for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyListing {
    /// Set when the listing shows the children of the only top-level key
    #[serde(rename = "root_context_key", skip_serializing_if = "Option::is_none")]
    pub context_key: Option<String>,
    pub keys: Vec<String>,
}

/// List top-level keys, drilling into the sole root when there is only one.
///
/// Entries of `outbounds`/`inbounds` are listed by tag, falling back to
/// their index when the tag is missing or empty.
pub fn list_keys(document: &[u8]) -> Result<KeyListing, DocumentError> {
    let doc = Document::parse(document).map_err(|_| DocumentError::InvalidDocument)?;
    let root = doc.root();
    if !root.is_object() {
        return Err(DocumentError::InvalidDocument);
    }

    let members: Vec<(&str, Value<'_>)> = root.members().collect();
    if let [(key, value)] = members.as_slice() {
        if value.is_object() || value.is_array() {
            return Ok(KeyListing {
                context_key: Some(key.to_string()),
                keys: child_keys(key, *value),
            });
        }
    }

    Ok(KeyListing {
        context_key: None,
        keys: members.iter().map(|(key, _)| key.to_string()).collect(),
    })
}

fn child_keys(parent: &str, value: Value<'_>) -> Vec<String> {
    if value.is_object() {
        return value.members().map(|(key, _)| key.to_string()).collect();
    }

    let by_tag = is_tagged_root(parent);
    value
        .elements()
        .enumerate()
        .map(|(index, element)| {
            by_tag
                .then(|| element_tag(element))
                .flatten()
                .unwrap_or_else(|| index.to_string())
        })
        .collect()
}

fn element_tag(element: Value<'_>) -> Option<String> {
    element
        .get(TAG_FIELD)?
        .as_str()
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}
