use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::previews::PreviewConfig;
use crate::shortcut::ShortcutOverride;
use crate::tabs::TabsConfig;

/// Editor configuration, read from camelCase JSON.
///
/// ```
/// use json_editor::JsonEditorConfig;
///
/// let config = JsonEditorConfig::from_json_str(r#"{
///     "shortcuts": {"moveUp": {"key": "alt+up"}},
///     "tabsConfig": {"defaultTabName": "Main", "tabs": []}
/// }"#).unwrap();
/// assert_eq!(config.shortcuts["moveUp"].key, "alt+up");
/// assert!(config.previews.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonEditorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs_config: Option<TabsConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previews: Vec<PreviewConfig>,
    /// Action name to chord overrides.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub shortcuts: IndexMap<String, ShortcutOverride>,
}

impl JsonEditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(
            JsonEditorConfig::from_json(json!({})).unwrap(),
            JsonEditorConfig::default()
        );
    }

    #[test]
    fn test_roundtrip_keeps_camel_case() {
        let raw = json!({
            "tabsConfig": {"defaultTabName": "Main", "tabs": [{"name": "Refs", "properties": ["references"]}]},
            "previews": [{"name": "pdf", "type": "pdf", "urlPath": "/documents/0/url"}],
            "shortcuts": {"delete": {"key": "mod+d"}}
        });
        let config = JsonEditorConfig::from_json(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn test_bad_config() {
        assert!(JsonEditorConfig::from_json_str(r#"{"previews": 3}"#).is_err());
    }
}
