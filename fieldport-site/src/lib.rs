//! A file-backed content site for field migrations.
//!
//! [`Site`] keeps fields, block types, groups, layouts and referenced sources
//! in memory and implements [`fieldport::Destination`]. [`SiteContext`] loads
//! and saves a site as a directory of YAML files.

pub mod context;
pub mod error;
pub mod site;
pub mod snapshot;

pub use context::{SiteContext, SiteContextBuilder};
pub use error::{Result, SiteError};
pub use site::{Counters, Site, StoredSource};
pub use snapshot::{BlockFile, FieldFile, SiteManifest};
