//! Field schema migration between content-management sites.
//!
//! Fields are exported from a live [`Destination`] into a portable,
//! handle-addressed [`FieldDef`] and imported back into another destination,
//! merging by handle so that repeated imports keep existing ids.

pub mod composite;
pub mod config;
pub mod error;
pub mod export;
pub mod hooks;
pub mod import;
pub mod key;
pub mod live;
pub mod logging;
pub mod migration;
pub mod registry;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod token;
pub mod types;

pub use config::{AddressingScheme, AssetTokenStyle, MigrationConfig};
pub use error::{ErrorSeverity, MigrationError, ReferenceKind, Result, SaveError, Severity};
pub use hooks::{MigrationHooks, NoHooks};
pub use key::{ItemKey, Keyed, RecordId};
pub use live::{
    FieldContext, FieldGroup, FieldLayout, LayoutField, LayoutTab, LiveBlockType, LiveField,
    NeoBlockType, NeoGroup, SectionType, SourceKind, SourceLookup, SourceRecord,
};
pub use logging::Pretty;
pub use migration::FieldMigration;
pub use registry::FieldTypeRegistry;
pub use report::Report;
pub use repository::{CompositeRepository, Destination, FieldRepository, SourceRepository};
pub use token::{RefToken, TokenPrefix};
pub use types::{field_types, BlockGroupDef, BlockTypeDef, FieldDef, FieldModel, TypeSettings};
