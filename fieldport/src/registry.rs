//! Field type registry.
//!
//! Maps a field type tag to the capabilities the engine has for it: a
//! reference resolver, a composite walker, or both. Types without an entry
//! pass through every stage unchanged.

use std::collections::HashMap;

use tracing::debug;

use crate::composite::{CompositeType, MatrixType, NeoType, SuperTableType};
use crate::report::Report;
use crate::resolver::{
    AssetsResolver, CategoriesResolver, EntriesResolver, RedactorResolver, ReferenceResolver,
    Sources, TagsResolver, UsersResolver,
};
use crate::types::{field_types, FieldDef};

#[derive(Default)]
pub struct FieldTypeRegistry {
    resolvers: HashMap<String, Box<dyn ReferenceResolver>>,
    composites: HashMap<String, Box<dyn CompositeType>>,
}

impl FieldTypeRegistry {
    /// A registry with no field types.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in field type.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register_resolver(field_types::ASSETS, AssetsResolver)
            .register_resolver(field_types::REDACTOR, RedactorResolver)
            .register_resolver(field_types::CATEGORIES, CategoriesResolver)
            .register_resolver(field_types::ENTRIES, EntriesResolver)
            .register_resolver(field_types::TAGS, TagsResolver)
            .register_resolver(field_types::USERS, UsersResolver)
            .register_composite(field_types::MATRIX, MatrixType)
            .register_composite(field_types::SUPER_TABLE, SuperTableType)
            .register_composite(field_types::NEO, NeoType);
        registry
    }

    pub fn register_resolver<R: ReferenceResolver + 'static>(
        &mut self,
        field_type: impl Into<String>,
        resolver: R,
    ) -> &mut Self {
        self.resolvers.insert(field_type.into(), Box::new(resolver));
        self
    }

    pub fn register_composite<C: CompositeType + 'static>(
        &mut self,
        field_type: impl Into<String>,
        composite: C,
    ) -> &mut Self {
        self.composites.insert(field_type.into(), Box::new(composite));
        self
    }

    pub fn resolver(&self, field_type: &str) -> Option<&dyn ReferenceResolver> {
        self.resolvers.get(field_type).map(|r| r.as_ref())
    }

    pub fn composite(&self, field_type: &str) -> Option<&dyn CompositeType> {
        self.composites.get(field_type).map(|c| c.as_ref())
    }

    pub fn is_composite(&self, field_type: &str) -> bool {
        self.composites.contains_key(field_type)
    }

    fn resolves_nested(&self, field_type: &str) -> bool {
        self.composite(field_type)
            .is_some_and(|composite| composite.resolves_nested())
    }

    /// Replace live keys with handles in `def` and every nested sub-field.
    pub fn resolve_handles(&self, def: &mut FieldDef, sources: &Sources<'_>) {
        if let Some(resolver) = self.resolver(&def.field_type) {
            debug!(handle = %def.handle, "resolving handles");
            resolver.ids_to_handles(&mut def.settings, sources);
        }
        if self.resolves_nested(&def.field_type) {
            for nested in def.settings.nested_fields_mut() {
                self.resolve_handles(nested, sources);
            }
        }
    }

    /// Replace handles with live reference tokens in `def` and every nested
    /// sub-field.
    pub fn resolve_ids(&self, def: &mut FieldDef, sources: &Sources<'_>, report: &mut Report) {
        if let Some(resolver) = self.resolver(&def.field_type) {
            debug!(handle = %def.handle, "resolving ids");
            resolver.handles_to_ids(&mut def.settings, sources, report);
        }
        if self.resolves_nested(&def.field_type) {
            for nested in def.settings.nested_fields_mut() {
                self.resolve_ids(nested, sources, report);
            }
        }
    }
}

impl std::fmt::Debug for FieldTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut resolvers: Vec<&String> = self.resolvers.keys().collect();
        let mut composites: Vec<&String> = self.composites.keys().collect();
        resolvers.sort();
        composites.sort();
        f.debug_struct("FieldTypeRegistry")
            .field("resolvers", &resolvers)
            .field("composites", &composites)
            .finish()
    }
}
