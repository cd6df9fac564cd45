//! Remote sources.
//!
//! URLTeam releases live on archive.org: the [catalog] lists releases by identifier,
//! and each release carries a [manifest] describing its member files.
pub mod catalog;
pub mod manifest;

pub use catalog::Catalog;
pub use manifest::{DumpEntry, Manifest};
