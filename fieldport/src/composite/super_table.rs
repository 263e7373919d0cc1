use tracing::debug;

use super::CompositeType;
use crate::export::ExportCx;
use crate::import::MergeCx;
use crate::key::ItemKey;
use crate::live::{FieldContext, LiveField};
use crate::types::{BlockTypeDef, FieldDef};

/// Live setting duplicated by the block type's sub-fields.
const COLUMNS: &str = "columns";

/// `verbb\supertable\fields\SuperTableField`. A table has exactly one block
/// type; its sub-fields are the columns.
#[derive(Debug, Default)]
pub struct SuperTableType;

impl CompositeType for SuperTableType {
    fn extract(&self, cx: &ExportCx<'_>, def: &mut FieldDef, field: &LiveField) {
        let mut ordinal = 0;
        for block in cx.dest().super_table_block_types(field.id) {
            let key = if cx.include_ids() {
                ItemKey::Existing(block.id)
            } else {
                ItemKey::NEW
            };
            let context = FieldContext::SuperTableBlockType(cx.block_key(&block.uid, block.id));
            let fields: Vec<FieldDef> = cx
                .dest()
                .fields_in_context(&context)
                .iter()
                .map(|sub| {
                    ordinal += 1;
                    cx.nested_field(sub, cx.key_for(ordinal, sub.id))
                })
                .collect();

            match def.settings.block_types.iter_mut().find(|b| b.key == key) {
                Some(existing) => existing.fields.extend(fields),
                None => def.settings.block_types.push(BlockTypeDef {
                    key,
                    fields,
                    ..Default::default()
                }),
            }
        }
        def.settings.remove(COLUMNS);
    }

    fn merge(&self, cx: &MergeCx<'_>, def: &mut FieldDef, existing: &LiveField) {
        let Some(mut block) = std::mem::take(&mut def.settings.block_types)
            .into_iter()
            .next()
        else {
            return;
        };
        match cx.dest().super_table_block_types(existing.id).into_iter().next() {
            Some(found) => {
                block.key = ItemKey::Existing(found.id);
                let context =
                    FieldContext::SuperTableBlockType(cx.block_key(&found.uid, found.id));
                cx.merge_fields(&mut block.fields, &context);
            }
            None => {
                debug!(field = %def.handle, "table has no stored block type");
                block.key = ItemKey::Pending(1);
            }
        }
        def.settings.block_types = vec![block];
    }
}
