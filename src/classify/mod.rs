//! Functional classification of a configuration directory
//!
//! Each file is filed under the first top-level key it carries that the
//! [`registry`] knows about. Files nothing recognizes are listed after every
//! known category, one pseudo-category per file.

pub mod registry;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::files::{CONFIG_SUFFIX, UNMATCHED_PREFIX};
use crate::document::Document;
use registry::{CategoryInfo, UNMATCHED_RANK};

/// One button of the directory overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionalEntry {
    #[serde(rename = "function_name")]
    pub name: String,
    #[serde(rename = "file_name")]
    pub file: String,
    #[serde(rename = "order")]
    pub rank: u32,
}

/// Files grouped under one registry category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalCategory {
    pub name: &'static str,
    pub rank: u32,
    /// Sorted by filename
    pub files: Vec<String>,
}

impl FunctionalCategory {
    /// One entry per file; several files get a 1-based " N" suffix
    pub fn entries(&self) -> Vec<FunctionalEntry> {
        if let [file] = self.files.as_slice() {
            return vec![FunctionalEntry {
                name: self.name.to_string(),
                file: file.clone(),
                rank: self.rank,
            }];
        }
        self.files
            .iter()
            .enumerate()
            .map(|(i, file)| FunctionalEntry {
                name: format!("{} {}", self.name, i + 1),
                file: file.clone(),
                rank: self.rank,
            })
            .collect()
    }
}

/// Result of classifying one directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Registry categories by rank, then unmatched files
    #[serde(rename = "ordered_functional_config")]
    pub ordered: Vec<FunctionalEntry>,
    /// Every candidate file, sorted
    #[serde(rename = "config_files")]
    pub files: Vec<String>,
    /// Files without a recognized root, sorted
    #[serde(rename = "unmatched_files")]
    pub unmatched: Vec<String>,
}

/// Display name for a file without a recognized root
pub fn unmatched_name(file: &str) -> String {
    let stem = file.strip_suffix(CONFIG_SUFFIX).unwrap_or(file);
    format!("{UNMATCHED_PREFIX}{stem}")
}

/// First registry category among the document's top-level keys.
///
/// `None` when the bytes do not parse, are not an object or carry no
/// recognized key.
pub fn root_category(document: &[u8]) -> Option<&'static CategoryInfo> {
    let doc = Document::parse(document).ok()?;
    let root = doc.root();
    if !root.is_object() {
        return None;
    }
    root.members().find_map(|(key, _)| registry::lookup(key))
}

/// Group `files` into functional categories.
///
/// A file listed without contents (it could not be read) still appears in
/// [`Classification::files`] but in no category.
pub fn classify(files: &[String], contents: &HashMap<String, Vec<u8>>) -> Classification {
    let mut grouped: BTreeMap<u32, (&'static CategoryInfo, Vec<String>)> = BTreeMap::new();
    let mut unmatched = Vec::new();

    for file in files {
        let Some(bytes) = contents.get(file) else {
            warn!(file = %file, "No contents for file, skipping classification");
            continue;
        };
        match root_category(bytes) {
            Some(info) => {
                debug!(file = %file, root = info.root, "Classified file");
                grouped
                    .entry(info.rank)
                    .or_insert_with(|| (info, Vec::new()))
                    .1
                    .push(file.clone());
            }
            None => {
                debug!(file = %file, "No recognized root key");
                unmatched.push(file.clone());
            }
        }
    }

    let mut ordered: Vec<FunctionalEntry> = grouped
        .into_values()
        .flat_map(|(info, mut files)| {
            files.sort();
            FunctionalCategory {
                name: info.display_name,
                rank: info.rank,
                files,
            }
            .entries()
        })
        .collect();
    ordered.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));

    unmatched.sort();
    ordered.extend(unmatched.iter().map(|file| FunctionalEntry {
        name: unmatched_name(file),
        file: file.clone(),
        rank: UNMATCHED_RANK,
    }));

    let mut files = files.to_vec();
    files.sort();

    Classification {
        ordered,
        files,
        unmatched,
    }
}
