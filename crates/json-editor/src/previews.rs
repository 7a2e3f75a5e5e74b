use json_editor_pointer::{format_path, get, parse_path, Path, PathStep};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Location of a preview URL inside the record, as a slash path or as a
/// list of keys and indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlPath {
    Pointer(String),
    Steps(Vec<Value>),
}

impl UrlPath {
    pub fn to_path(&self) -> Path {
        match self {
            UrlPath::Pointer(pointer) => parse_path(pointer),
            UrlPath::Steps(steps) => steps
                .iter()
                .map(|step| match step {
                    Value::Number(n) => match n.as_u64().and_then(|i| usize::try_from(i).ok()) {
                        Some(index) => PathStep::Index(index),
                        None => PathStep::Key(n.to_string()),
                    },
                    Value::String(key) => PathStep::from(key.as_str()),
                    other => PathStep::Key(other.to_string()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_path: Option<UrlPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("preview {0:?} sets neither url nor urlPath")]
    NoUrlSource(String),
}

/// Resolves preview URLs against the record. A `urlPath` that is missing
/// from the record (or not a string there) skips that preview.
pub fn extract_previews(
    configs: &[PreviewConfig],
    record: &Value,
) -> Result<Vec<Preview>, PreviewError> {
    let mut previews = Vec::with_capacity(configs.len());
    for config in configs {
        let url = match (&config.url, &config.url_path) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(url_path)) => {
                let path = url_path.to_path();
                let found = get(record, &path).and_then(Value::as_str).map(str::to_owned);
                if found.is_none() {
                    tracing::warn!(
                        preview = %config.name,
                        path = %format_path(&path),
                        "preview url path is not present in the record"
                    );
                }
                found
            }
            (None, None) => return Err(PreviewError::NoUrlSource(config.name.clone())),
        };
        if let Some(url) = url.filter(|url| !url.is_empty()) {
            previews.push(Preview {
                name: config.name.clone(),
                kind: config.kind.clone(),
                url,
            });
        }
    }
    Ok(previews)
}
