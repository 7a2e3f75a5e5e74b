//! Grouping of top-level record keys into named tabs.

use indexmap::IndexMap;
use json_editor_schema::{ObjectSchema, Schema, SchemaBase};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Tab name used when no tabs are configured.
pub const IMPLICIT_TAB_NAME: &str = "record";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsConfig {
    pub default_tab_name: String,
    #[serde(default)]
    pub tabs: Vec<TabConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfig {
    pub name: String,
    /// Key patterns; each must match a whole key.
    #[serde(default)]
    pub properties: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TabsError {
    #[error("tab {tab:?} has invalid key pattern {pattern:?}: {source}")]
    Pattern {
        tab: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("duplicate tab name {0:?}")]
    DuplicateTab(String),
}

#[derive(Debug, Clone)]
pub struct TabGrouping {
    tab_names: Vec<String>,
    default_tab: String,
    patterns: Vec<(String, Vec<Regex>)>,
    key_to_tab: IndexMap<String, String>,
}

impl TabGrouping {
    /// Assigns every schema property to the first tab with a matching
    /// pattern, or to the default tab.
    pub fn new(config: &TabsConfig, schema: &Schema) -> Result<TabGrouping, TabsError> {
        let mut tab_names: Vec<String> = Vec::with_capacity(config.tabs.len() + 1);
        let mut patterns = Vec::with_capacity(config.tabs.len());
        for tab in &config.tabs {
            if tab_names.contains(&tab.name) {
                return Err(TabsError::DuplicateTab(tab.name.clone()));
            }
            let compiled = tab
                .properties
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(&format!("^(?:{pattern})$"))
                        .build()
                        .map_err(|source| TabsError::Pattern {
                            tab: tab.name.clone(),
                            pattern: pattern.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            tab_names.push(tab.name.clone());
            patterns.push((tab.name.clone(), compiled));
        }
        if !tab_names.contains(&config.default_tab_name) {
            tab_names.push(config.default_tab_name.clone());
        }
        let mut grouping = TabGrouping {
            tab_names,
            default_tab: config.default_tab_name.clone(),
            patterns,
            key_to_tab: IndexMap::new(),
        };
        if let Some(object) = schema.as_object() {
            for key in object.properties.keys() {
                let tab = grouping.match_tab(key).to_owned();
                grouping.key_to_tab.insert(key.clone(), tab);
            }
        }
        Ok(grouping)
    }

    /// Configured tab names in order, followed by the default tab.
    pub fn tab_names(&self) -> &[String] {
        &self.tab_names
    }

    pub fn default_tab(&self) -> &str {
        &self.default_tab
    }

    pub fn key_to_tab(&self) -> &IndexMap<String, String> {
        &self.key_to_tab
    }

    pub fn tab_for(&self, key: &str) -> &str {
        match self.key_to_tab.get(key) {
            Some(tab) => tab,
            None => self.match_tab(key),
        }
    }

    /// Splits a record into one sub-record per tab. Every tab is present,
    /// possibly empty.
    pub fn group(&self, doc: &Value) -> IndexMap<String, Value> {
        let mut out: IndexMap<String, Map<String, Value>> = self
            .tab_names
            .iter()
            .map(|name| (name.clone(), Map::new()))
            .collect();
        if let Some(record) = doc.as_object() {
            for (key, value) in record {
                if let Some(sub) = out.get_mut(self.tab_for(key)) {
                    sub.insert(key.clone(), value.clone());
                }
            }
        }
        out.into_iter()
            .map(|(name, sub)| (name, Value::Object(sub)))
            .collect()
    }

    /// Object schema of each tab, restricted to the keys that tab shows.
    pub fn sub_schemas(&self, schema: &Schema) -> IndexMap<String, Schema> {
        let mut out: IndexMap<String, ObjectSchema> = self
            .tab_names
            .iter()
            .map(|name| {
                let sub = ObjectSchema {
                    base: SchemaBase::default(),
                    properties: IndexMap::new(),
                    required: Vec::new(),
                };
                (name.clone(), sub)
            })
            .collect();
        if let Some(object) = schema.as_object() {
            for (key, prop) in &object.properties {
                if let Some(sub) = out.get_mut(self.tab_for(key)) {
                    sub.properties.insert(key.clone(), prop.clone());
                    if object.is_required(key) {
                        sub.required.push(key.clone());
                    }
                }
            }
        }
        out.into_iter()
            .map(|(name, sub)| (name, Schema::Object(sub)))
            .collect()
    }

    fn match_tab(&self, key: &str) -> &str {
        self.patterns
            .iter()
            .find(|(_, regexes)| regexes.iter().any(|re| re.is_match(key)))
            .map_or(self.default_tab.as_str(), |(name, _)| name.as_str())
    }
}

/// Groups `doc` by `grouping`, or into a single implicit tab holding the
/// whole document when there is no tab configuration.
pub fn group_document(doc: &Value, grouping: Option<&TabGrouping>) -> IndexMap<String, Value> {
    match grouping {
        Some(grouping) => grouping.group(doc),
        None => {
            let mut out = IndexMap::new();
            out.insert(IMPLICIT_TAB_NAME.to_owned(), doc.clone());
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_json(&json!({
            "type": "object",
            "required": ["titles"],
            "properties": {
                "titles": {"type": "array"},
                "abstracts": {"type": "array"},
                "references": {"type": "array"},
                "reference_count": {"type": "integer"},
                "control_number": {"type": "integer"}
            }
        }))
        .unwrap()
    }

    fn config() -> TabsConfig {
        serde_json::from_value(json!({
            "defaultTabName": "Main",
            "tabs": [
                {"name": "References", "properties": ["reference.*"]},
                {"name": "Text", "properties": ["titles", "abstracts"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_key_to_tab() {
        let g = TabGrouping::new(&config(), &schema()).unwrap();
        assert_eq!(g.tab_names(), ["References", "Text", "Main"]);
        assert_eq!(g.tab_for("references"), "References");
        assert_eq!(g.tab_for("reference_count"), "References");
        assert_eq!(g.tab_for("titles"), "Text");
        assert_eq!(g.tab_for("control_number"), "Main");
        assert_eq!(g.tab_for("not_in_schema"), "Main");
    }

    #[test]
    fn test_patterns_are_anchored() {
        let g = TabGrouping::new(&config(), &schema()).unwrap();
        assert_eq!(g.tab_for("subtitles"), "Main");
    }

    #[test]
    fn test_group_keeps_every_tab() {
        let g = TabGrouping::new(&config(), &schema()).unwrap();
        let groups = g.group(&json!({"titles": [{"title": "x"}], "control_number": 1}));
        assert_eq!(groups["References"], json!({}));
        assert_eq!(groups["Text"], json!({"titles": [{"title": "x"}]}));
        assert_eq!(groups["Main"], json!({"control_number": 1}));
    }

    #[test]
    fn test_sub_schemas() {
        let g = TabGrouping::new(&config(), &schema()).unwrap();
        let subs = g.sub_schemas(&schema());
        let text = subs["Text"].as_object().unwrap();
        assert_eq!(text.properties.keys().collect::<Vec<_>>(), ["titles", "abstracts"]);
        assert_eq!(text.required, vec!["titles".to_owned()]);
        assert!(subs["References"].as_object().unwrap().required.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let mut cfg = config();
        cfg.tabs[0].properties.push("(".into());
        assert!(matches!(
            TabGrouping::new(&cfg, &schema()),
            Err(TabsError::Pattern { .. })
        ));
    }

    #[test]
    fn test_implicit_tab() {
        let doc = json!({"a": 1});
        let groups = group_document(&doc, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[IMPLICIT_TAB_NAME], doc);
    }
}
