//! Symbolic path resolution
//!
//! Users address inbound/outbound entries by tag ("outbounds.hk"); the
//! accessor only understands positions ("outbounds.1"). `resolve` translates
//! the former into the latter and passes every other path through untouched.

use tracing::debug;

use crate::constants::document::{PATH_SEPARATOR, TAGGED_ROOTS, TAG_FIELD};
use crate::document::Document;

/// Whether `root` names an array whose entries are addressed by tag
pub fn is_tagged_root(root: &str) -> bool {
    TAGGED_ROOTS.contains(&root)
}

/// Translate a symbolic path into a positional one.
///
/// Only the first segment is inspected: `outbounds.<tag>` and
/// `inbounds.<tag>` become `<root>.<index>` of the first entry whose `tag`
/// string equals the selector. Anything else, including a tag that matches
/// no entry, comes back unchanged so the following lookup reports it as
/// missing instead of touching the wrong entry.
pub fn resolve(document: &[u8], path: &str) -> String {
    let Some((root, selector)) = path.split_once(PATH_SEPARATOR) else {
        return path.to_string();
    };
    if !is_tagged_root(root) {
        return path.to_string();
    }

    match find_tag(document, root, selector) {
        Some(index) => {
            let resolved = format!("{root}{PATH_SEPARATOR}{index}");
            debug!(path = %path, resolved = %resolved, "Resolved tag path");
            resolved
        }
        None => {
            debug!(path = %path, "No entry carries this tag, leaving path unresolved");
            path.to_string()
        }
    }
}

/// Index of the first entry under `root` whose tag equals `tag`.
///
/// An empty selector never matches, even an entry tagged `""`.
fn find_tag(document: &[u8], root: &str, tag: &str) -> Option<usize> {
    if tag.is_empty() {
        return None;
    }
    let doc = Document::parse(document).ok()?;
    let list = doc.get(root).ok()?;
    if !list.is_array() {
        return None;
    }
    list.elements()
        .position(|element| element.get(TAG_FIELD).and_then(|field| field.as_str()) == Some(tag))
}
