use tracing::debug;

use super::CompositeType;
use crate::export::ExportCx;
use crate::import::MergeCx;
use crate::key::ItemKey;
use crate::live::{FieldContext, LiveField};
use crate::types::{BlockTypeDef, FieldDef};

/// `craft\fields\Matrix`
#[derive(Debug, Default)]
pub struct MatrixType;

impl CompositeType for MatrixType {
    fn extract(&self, cx: &ExportCx<'_>, def: &mut FieldDef, field: &LiveField) {
        for (ordinal, block) in (1..).zip(cx.dest().matrix_block_types(field.id)) {
            debug!(field = %field.handle, block = %block.handle, "extracting matrix block");
            let context = FieldContext::MatrixBlockType(cx.block_key(&block.uid, block.id));
            let mut block_def =
                BlockTypeDef::new(cx.key_for(ordinal, block.id), block.name, block.handle);
            block_def.fields = cx.nested_fields(&context);
            def.settings.block_types.push(block_def);
        }
    }

    fn merge(&self, cx: &MergeCx<'_>, def: &mut FieldDef, existing: &LiveField) {
        let live = cx.dest().matrix_block_types(existing.id);
        for block in def.settings.block_types.iter_mut() {
            let Some(found) = live.iter().find(|b| b.handle == block.handle) else {
                debug!(block = %block.handle, key = %block.key, "new matrix block");
                continue;
            };
            block.key = ItemKey::Existing(found.id);
            block.field_layout_id = found.field_layout_id;
            block.sort_order = found.sort_order;
            let context = FieldContext::MatrixBlockType(cx.block_key(&found.uid, found.id));
            cx.merge_fields(&mut block.fields, &context);
        }
    }
}
