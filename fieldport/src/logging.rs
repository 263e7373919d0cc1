//! Log formatting helpers.

use serde::Serialize;
use std::fmt::Debug;

/// Renders a value as YAML on its own lines inside a log event.
///
/// ```ignore
/// debug!("saving model: {}", Pretty(&model));
/// ```
///
/// Falls back to the `Debug` form if the value cannot be serialized.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml.trim_end()),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{field_types, FieldDef};

    #[test]
    fn renders_yaml_on_new_line() {
        let def = FieldDef::new("summary", "Summary", field_types::PLAIN_TEXT);
        let rendered = Pretty(&def).to_string();
        assert!(rendered.starts_with('\n'));
        assert!(rendered.contains("handle: summary"));
        assert!(!rendered.ends_with('\n'));
    }
}
