#![forbid(unsafe_code)]

//! Tag-aware viewing and editing of sing-box configuration directories.
//!
//! The core is four synchronous functions over raw document bytes:
//! [`resolve`], [`patch::write`] (with its [`patch::read`] counterpart),
//! [`keys::list_keys`] and [`classify::classify`]. [`workspace`] wraps them
//! with the file handling of a configuration directory.

pub mod classify;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod keys;
pub mod patch;
pub mod resolve;
pub mod workspace;

pub use classify::{classify, Classification, FunctionalEntry};
pub use error::{AccessError, DocumentError};
pub use keys::{list_keys, KeyListing};
pub use patch::{read, write};
pub use resolve::resolve;
