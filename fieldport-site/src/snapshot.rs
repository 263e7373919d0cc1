//! Serializable form of a [`Site`].
//!
//! A snapshot is one manifest holding counters, groups, sources and layouts,
//! plus one document per top-level field that nests its block types and
//! sub-fields.

use fieldport::{
    CompositeRepository, FieldLayout, FieldGroup, FieldRepository, LiveBlockType, LiveField,
    NeoBlockType, NeoGroup,
};
use serde::{Deserialize, Serialize};

use crate::site::{BlockTable, Counters, Site, StoredSource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteManifest {
    pub counters: Counters,
    pub groups: Vec<FieldGroup>,
    pub sources: Vec<StoredSource>,
    pub layouts: Vec<FieldLayout>,
}

/// A stored field with everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFile {
    #[serde(flatten)]
    pub field: LiveField,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matrix_block_types: Vec<BlockFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub super_table_block_types: Vec<BlockFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neo_block_types: Vec<NeoBlockType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neo_groups: Vec<NeoGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFile {
    #[serde(flatten)]
    pub block: LiveBlockType,
    #[serde(default)]
    pub fields: Vec<FieldFile>,
}

impl Site {
    /// Split the site into its manifest and one document per top-level field.
    pub fn to_snapshot(&self) -> (SiteManifest, Vec<FieldFile>) {
        let manifest = SiteManifest {
            counters: self.counters.clone(),
            groups: self.groups.clone(),
            sources: self.sources.clone(),
            layouts: self.layouts.clone(),
        };
        let fields = self
            .fields
            .iter()
            .filter(|f| f.context.is_global())
            .map(|f| self.field_file(f))
            .collect();
        (manifest, fields)
    }

    /// Rebuild a site. Top-level fields are stored in id order.
    pub fn from_snapshot(manifest: SiteManifest, mut fields: Vec<FieldFile>) -> Self {
        let mut site = Site {
            counters: manifest.counters,
            groups: manifest.groups,
            sources: manifest.sources,
            layouts: manifest.layouts,
            ..Site::default()
        };
        fields.sort_by_key(|f| f.field.id);
        for file in fields {
            site.restore(file);
        }
        site
    }

    fn field_file(&self, field: &LiveField) -> FieldFile {
        FieldFile {
            field: field.clone(),
            matrix_block_types: self.block_files(BlockTable::Matrix, field.id),
            super_table_block_types: self.block_files(BlockTable::SuperTable, field.id),
            neo_block_types: self.neo_block_types(field.id),
            neo_groups: self.neo_groups(field.id),
        }
    }

    fn block_files(&self, table: BlockTable, field_id: i64) -> Vec<BlockFile> {
        self.sorted_blocks(table, field_id)
            .into_iter()
            .map(|block| BlockFile {
                fields: self
                    .fields_in_context(&table.context(&block.uid))
                    .iter()
                    .map(|f| self.field_file(f))
                    .collect(),
                block,
            })
            .collect()
    }

    fn restore(&mut self, file: FieldFile) {
        self.bump_counters(&file);
        self.fields.push(file.field);
        for block in file.matrix_block_types {
            self.matrix_blocks.push(block.block);
            for field in block.fields {
                self.restore(field);
            }
        }
        for block in file.super_table_block_types {
            self.table_blocks.push(block.block);
            for field in block.fields {
                self.restore(field);
            }
        }
        self.neo_blocks.extend(file.neo_block_types);
        self.neo_groups.extend(file.neo_groups);
    }

    /// Hand-edited snapshots may carry ids past the stored counters.
    fn bump_counters(&mut self, file: &FieldFile) {
        let counters = &mut self.counters;
        counters.fields = counters.fields.max(file.field.id);
        for block in file
            .matrix_block_types
            .iter()
            .chain(&file.super_table_block_types)
        {
            counters.block_types = counters.block_types.max(block.block.id);
        }
        for block in &file.neo_block_types {
            counters.neo_block_types = counters.neo_block_types.max(block.id);
        }
        for group in &file.neo_groups {
            counters.neo_groups = counters.neo_groups.max(group.id);
        }
    }
}
