//! Portable documents and sites shared by the integration tests.

#![allow(dead_code)]

use fieldport::{
    field_types, BlockTypeDef, FieldContext, FieldDef, FieldRepository, ItemKey, LiveField,
};
use fieldport_site::Site;
use serde_json::json;

pub fn text(handle: &str) -> FieldDef {
    FieldDef::new(handle, handle.to_uppercase(), field_types::PLAIN_TEXT)
}

pub fn nested(ordinal: u32, def: FieldDef) -> FieldDef {
    def.with_key(ItemKey::Pending(ordinal))
}

pub fn image(handle: &str, volume: &str) -> FieldDef {
    FieldDef::new(handle, "Image", field_types::ASSETS)
        .with_setting("sources", json!([volume]))
        .with_setting("defaultUploadLocationSource", json!(volume))
}

/// A matrix with a text block and a quote block.
pub fn body() -> FieldDef {
    FieldDef::new("body", "Body", field_types::MATRIX)
        .with_group("Content")
        .with_setting("maxBlocks", json!(5))
        .with_block_type(
            BlockTypeDef::new(ItemKey::Pending(1), "Text", "text")
                .with_field(nested(1, text("copy").with_setting("multiline", json!(true))))
                .with_field(nested(2, image("image", "images"))),
        )
        .with_block_type(
            BlockTypeDef::new(ItemKey::Pending(2), "Quote", "quote")
                .with_field(nested(1, text("quote"))),
        )
}

/// A site with an `images` volume.
pub fn site_with_images() -> Site {
    let mut site = Site::new();
    site.add_volume("images");
    site
}

pub fn global(site: &Site, handle: &str) -> LiveField {
    site.field_by_handle(handle, &FieldContext::Global)
        .unwrap_or_else(|| panic!("no field {handle}"))
}
