use tracing::{debug, warn};

use super::CompositeType;
use crate::error::{MigrationError, ReferenceKind};
use crate::export::ExportCx;
use crate::import::{MergeCx, SaveCx};
use crate::key::{ItemKey, RecordId};
use crate::live::{FieldContext, FieldLayout, LayoutField, LayoutTab, LiveField, NeoBlockType};
use crate::types::{field_types, BlockGroupDef, BlockTypeDef, FieldDef, GROUPS_SETTING};

/// `benf\neo\Field`. Block types are arranged in groups and reference global
/// fields through per-block field layouts instead of owning sub-fields.
#[derive(Debug, Default)]
pub struct NeoType;

impl NeoType {
    fn block_def(cx: &ExportCx<'_>, ordinal: u32, block: NeoBlockType) -> BlockTypeDef {
        let mut def = BlockTypeDef::new(cx.key_for(ordinal, block.id), block.name, block.handle);
        def.max_blocks = block.max_blocks;
        def.max_sibling_blocks = block.max_sibling_blocks;
        def.max_child_blocks = block.max_child_blocks;
        def.child_blocks = block.child_blocks;
        def.top_level = Some(block.top_level);
        def.sort_order = block.sort_order;

        let Some(mut layout) = block.field_layout_id.and_then(|id| cx.dest().field_layout(id)) else {
            return def;
        };
        layout.tabs.sort_by_key(|tab| tab.sort_order);
        for mut tab in layout.tabs {
            tab.fields.sort_by_key(|f| f.sort_order);
            let mut handles = Vec::with_capacity(tab.fields.len());
            for layout_field in &tab.fields {
                let Some(field) = cx.dest().field_by_id(layout_field.field_id) else {
                    warn!(block = %def.handle, id = layout_field.field_id, "layout references a missing field");
                    continue;
                };
                if layout_field.required {
                    def.required_fields.push(field.handle.clone());
                }
                handles.push(field.handle);
            }
            def.field_layout.insert(tab.name, handles);
        }
        def
    }

    fn layout_for(cx: &mut SaveCx<'_>, block: &BlockTypeDef) -> FieldLayout {
        let mut tabs = Vec::with_capacity(block.field_layout.len());
        for (tab_order, (name, handles)) in (1..).zip(&block.field_layout) {
            let mut fields = Vec::with_capacity(handles.len());
            for handle in handles {
                let Some(field) = cx.dest.field_by_handle(handle, &FieldContext::Global) else {
                    cx.report
                        .add_error(MigrationError::unresolvable(ReferenceKind::LayoutField, handle.as_str()));
                    continue;
                };
                fields.push(LayoutField {
                    field_id: field.id,
                    required: block.required_fields.contains(handle),
                    sort_order: fields.len() as i64 + 1,
                });
            }
            tabs.push(LayoutTab {
                name: name.clone(),
                sort_order: tab_order,
                fields,
            });
        }
        FieldLayout {
            id: None,
            layout_type: field_types::NEO_BLOCK_TYPE.to_string(),
            tabs,
        }
    }
}

impl CompositeType for NeoType {
    fn extract(&self, cx: &ExportCx<'_>, def: &mut FieldDef, field: &LiveField) {
        def.settings.remove(GROUPS_SETTING);
        def.settings.groups = cx
            .dest()
            .neo_groups(field.id)
            .into_iter()
            .map(|group| BlockGroupDef {
                name: group.name,
                sort_order: group.sort_order,
            })
            .collect();

        for (ordinal, block) in (1..).zip(cx.dest().neo_block_types(field.id)) {
            debug!(field = %field.handle, block = %block.handle, "extracting neo block");
            def.settings.block_types.push(Self::block_def(cx, ordinal, block));
        }
    }

    // Sub-fields are not reconciled for this type: block types are re-keyed
    // and their layouts are rebuilt from handles on save.
    fn merge(&self, cx: &MergeCx<'_>, def: &mut FieldDef, existing: &LiveField) {
        let live = cx.dest().neo_block_types(existing.id);
        for block in def.settings.block_types.iter_mut() {
            if let Some(found) = live.iter().find(|b| b.handle == block.handle) {
                block.key = ItemKey::Existing(found.id);
            }
        }
    }

    fn resolves_nested(&self) -> bool {
        false
    }

    fn prepare(&self, cx: &mut SaveCx<'_>, def: &mut FieldDef) {
        let blocks = std::mem::take(&mut def.settings.block_types);
        for mut block in blocks {
            let layout = Self::layout_for(cx, &block);
            match cx.dest.save_field_layout(&layout) {
                Ok(id) => {
                    debug!(block = %block.handle, layout = id, "saved neo field layout");
                    block.field_layout_id = Some(id);
                    def.settings.block_types.push(block);
                }
                Err(err) => cx.report.add_error(MigrationError::LayoutSaveFailed {
                    block_type: block.handle.clone(),
                    reason: err.to_string(),
                }),
            }
        }
    }

    // Every layout id on a prepared block type is one `prepare` just saved.
    fn staged_layouts(&self, def: &FieldDef) -> Vec<RecordId> {
        def.settings
            .block_types
            .iter()
            .filter_map(|block| block.field_layout_id)
            .collect()
    }
}
