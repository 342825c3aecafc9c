use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use styleaudit_contracts::fonts::{FontInfoMap, TextStyle};

use crate::config::AuditConfig;
use crate::http::json_body;

/// Read access to a design-tool document.
pub trait DocumentSource: Send + Sync {
    fn fetch_file(&self, file_key: &str) -> Result<Value>;
}

pub struct FigmaClient {
    api_base: String,
    token: String,
    http: HttpClient,
}

impl FigmaClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            http: HttpClient::new(),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(&config.figma_api_base, &config.figma_token)
    }

    fn file_endpoint(&self, file_key: &str) -> String {
        format!("{}/files/{}", self.api_base, file_key)
    }
}

impl DocumentSource for FigmaClient {
    fn fetch_file(&self, file_key: &str) -> Result<Value> {
        let endpoint = self.file_endpoint(file_key);
        let response = self
            .http
            .get(&endpoint)
            .header("X-Figma-Token", &self.token)
            .send()
            .with_context(|| format!("Figma request failed ({endpoint})"))?;
        json_body("Figma", response)
    }
}

/// Node of a Figma document tree, reduced to what typography collection
/// needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FigmaNode {
    Text {
        characters: String,
        style: TextStyle,
        children: Vec<FigmaNode>,
    },
    Container {
        kind: String,
        children: Vec<FigmaNode>,
    },
}

impl FigmaNode {
    pub fn from_value(value: &Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let children = value
            .get("children")
            .and_then(Value::as_array)
            .map(|rows| rows.iter().map(Self::from_value).collect())
            .unwrap_or_default();
        if kind == "TEXT" {
            return Self::Text {
                characters: value
                    .get("characters")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                style: TextStyle::from_style_value(value.get("style")),
                children,
            };
        }
        Self::Container {
            kind: kind.to_string(),
            children,
        }
    }

    pub fn children(&self) -> &[FigmaNode] {
        match self {
            Self::Text { children, .. } | Self::Container { children, .. } => children,
        }
    }

    /// Depth-first, in child order.
    pub fn collect_text_styles(&self, out: &mut FontInfoMap) {
        if let Self::Text {
            characters, style, ..
        } = self
        {
            if !characters.trim().is_empty() {
                out.insert(characters.clone(), style.clone());
            }
        }
        for child in self.children() {
            child.collect_text_styles(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleCollectError {
    #[error("Figma response has no document (available keys: {})", .available_keys.join(", "))]
    MissingDocument { available_keys: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleCollection {
    pub fonts: FontInfoMap,
    pub top_level_nodes: usize,
}

/// Builds the text -> typography map from a `GET /files/:key` response.
pub fn collect_text_styles(response: &Value) -> Result<StyleCollection, StyleCollectError> {
    let Some(document) = response.get("document") else {
        return Err(StyleCollectError::MissingDocument {
            available_keys: response
                .as_object()
                .map(|object| object.keys().cloned().collect())
                .unwrap_or_default(),
        });
    };
    let root = FigmaNode::from_value(document);
    let mut fonts = FontInfoMap::new();
    root.collect_text_styles(&mut fonts);
    Ok(StyleCollection {
        fonts,
        top_level_nodes: root.children().len(),
    })
}

/// One document request followed by collection.
pub fn fetch_text_styles(
    source: &dyn DocumentSource,
    config: &AuditConfig,
) -> Result<StyleCollection> {
    let response = source.fetch_file(&config.figma_file_key)?;
    Ok(collect_text_styles(&response)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use styleaudit_contracts::fonts::TextStyle;

    use super::{collect_text_styles, FigmaNode, StyleCollectError};

    fn text(characters: &str, size: u64, family: &str) -> serde_json::Value {
        json!({
            "type": "TEXT",
            "characters": characters,
            "style": {"fontSize": size, "fontFamily": family},
        })
    }

    #[test]
    fn later_duplicate_text_wins() -> anyhow::Result<()> {
        let response = json!({
            "name": "Landing",
            "document": {
                "type": "DOCUMENT",
                "children": [
                    {"type": "CANVAS", "children": [text("Sign up", 14, "Poppins")]},
                    {"type": "CANVAS", "children": [
                        {"type": "FRAME", "children": [text("Sign up", 18, "Noto Sans JP")]},
                    ]},
                ],
            },
        });

        let collection = collect_text_styles(&response)?;
        assert_eq!(collection.fonts.len(), 1);
        assert_eq!(
            collection.fonts.get("Sign up"),
            Some(&TextStyle::new(18, "Noto Sans JP"))
        );
        assert_eq!(collection.top_level_nodes, 2);
        Ok(())
    }

    #[test]
    fn blank_text_is_skipped() -> anyhow::Result<()> {
        let response = json!({
            "document": {
                "type": "DOCUMENT",
                "children": [
                    text("   ", 12, "Poppins"),
                    text("", 12, "Poppins"),
                    text("Hello", 24, "Poppins"),
                ],
            },
        });
        let collection = collect_text_styles(&response)?;
        assert!(collection.fonts.get("   ").is_none());
        assert!(collection.fonts.get("").is_none());
        assert_eq!(collection.fonts.len(), 1);
        Ok(())
    }

    #[test]
    fn instances_and_components_are_walked_like_any_container() -> anyhow::Result<()> {
        let response = json!({
            "document": {
                "type": "DOCUMENT",
                "children": [{
                    "type": "COMPONENT",
                    "children": [{
                        "type": "INSTANCE",
                        "children": [text("Buy now", 16, "Poppins")],
                    }],
                }],
            },
        });
        let collection = collect_text_styles(&response)?;
        assert_eq!(
            collection.fonts.get("Buy now"),
            Some(&TextStyle::new(16, "Poppins"))
        );
        Ok(())
    }

    #[test]
    fn missing_style_fields_default_to_unknown() -> anyhow::Result<()> {
        let response = json!({
            "document": {"type": "DOCUMENT", "children": [
                {"type": "TEXT", "characters": "Caption"},
                {"type": "TEXT", "characters": "Label", "style": {"fontSize": 11.5}},
            ]},
        });
        let collection = collect_text_styles(&response)?;
        assert_eq!(
            serde_json::to_value(&collection.fonts)?,
            json!({
                "Caption": {"fontSize": "unknown", "fontFamily": "unknown"},
                "Label": {"fontSize": 11.5, "fontFamily": "unknown"},
            })
        );
        Ok(())
    }

    #[test]
    fn response_without_document_is_an_error() {
        let response = json!({"status": 403, "err": "Invalid token"});
        assert_eq!(
            collect_text_styles(&response).err(),
            Some(StyleCollectError::MissingDocument {
                available_keys: vec!["status".to_string(), "err".to_string()],
            })
        );
    }

    #[test]
    fn traversal_follows_child_order() {
        let node = FigmaNode::from_value(&json!({
            "type": "FRAME",
            "children": [text("First", 10, "A"), text("Second", 10, "B")],
        }));
        let mut fonts = styleaudit_contracts::fonts::FontInfoMap::new();
        node.collect_text_styles(&mut fonts);
        let keys: Vec<&str> = fonts.iter().map(|(text, _)| text).collect();
        assert_eq!(keys, vec!["First", "Second"]);
    }
}
