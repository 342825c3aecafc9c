use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::extract::{extract_json, JsonExtractError};
use crate::fonts::{FontInfoMap, UNKNOWN};

pub const DESIGN_FALLBACK_JSON: &str = r#"{"sections": []}"#;

/// Design extraction as it travels through the pipeline: untouched model text
/// until someone asks for it to be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignDraft {
    Raw(String),
    Parsed(Value),
}

impl DesignDraft {
    pub fn fallback() -> Self {
        Self::Raw(DESIGN_FALLBACK_JSON.to_string())
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// Parsed document, or the raw text handed back with the reason it could
    /// not be parsed.
    pub fn into_parsed(self) -> Result<Value, (String, JsonExtractError)> {
        match self {
            Self::Raw(text) => match extract_json(&text) {
                Ok(value) => Ok(value),
                Err(err) => Err((text, err)),
            },
            Self::Parsed(value) => Ok(value),
        }
    }

    pub fn parse(self) -> Result<Self, (Self, JsonExtractError)> {
        self.into_parsed()
            .map(Self::Parsed)
            .map_err(|(text, err)| (Self::Raw(text), err))
    }

    /// Backfills unknown font sizes. Raw drafts are left alone.
    pub fn merge_font_sizes(&mut self, fonts: &FontInfoMap, policy: FontMergePolicy) -> usize {
        match self {
            Self::Raw(_) => 0,
            Self::Parsed(document) => merge_font_sizes(document, fonts, policy),
        }
    }

    /// Raw text becomes a JSON string, parsed drafts are cloned.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Raw(text) => Value::String(text.clone()),
            Self::Parsed(value) => value.clone(),
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "null".to_string())
    }
}

/// What a matched element's `fontSize` is overwritten with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontMergePolicy {
    /// The scalar size from the font map.
    #[default]
    SizeOnly,
    /// The whole `{fontSize, fontFamily}` record.
    FullRecord,
}

impl FromStr for FontMergePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "size" | "size-only" | "scalar" => Ok(Self::SizeOnly),
            "record" | "full-record" => Ok(Self::FullRecord),
            other => Err(format!(
                "unknown merge policy '{other}' (expected 'size' or 'record')"
            )),
        }
    }
}

impl fmt::Display for FontMergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeOnly => f.write_str("size"),
            Self::FullRecord => f.write_str("record"),
        }
    }
}

/// Returns how many elements had their `fontSize` replaced.
pub fn merge_font_sizes(document: &mut Value, fonts: &FontInfoMap, policy: FontMergePolicy) -> usize {
    let mut updated = 0;
    for element in design_elements_mut(document) {
        if !needs_font_size(element) {
            continue;
        }
        let Some(style) = element
            .get("content")
            .and_then(Value::as_str)
            .and_then(|content| fonts.get(content))
        else {
            continue;
        };
        let replacement = match policy {
            FontMergePolicy::SizeOnly => style.font_size_value(),
            FontMergePolicy::FullRecord => style.to_value(),
        };
        element.insert("fontSize".to_string(), replacement);
        updated += 1;
    }
    updated
}

fn needs_font_size(element: &Map<String, Value>) -> bool {
    match element.get("fontSize") {
        None | Some(Value::Null) => true,
        Some(Value::String(value)) => value == UNKNOWN,
        Some(_) => false,
    }
}

fn design_elements_mut(document: &mut Value) -> Vec<&mut Map<String, Value>> {
    match document {
        Value::Object(root) if root.contains_key("sections") => root
            .get_mut("sections")
            .and_then(Value::as_array_mut)
            .map(|sections| {
                sections
                    .iter_mut()
                    .filter_map(|section| section.get_mut("elements"))
                    .filter_map(Value::as_array_mut)
                    .flat_map(|elements| elements.iter_mut())
                    .filter_map(Value::as_object_mut)
                    .collect()
            })
            .unwrap_or_default(),
        Value::Array(elements) => elements
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .collect(),
        _ => Vec::new(),
    }
}
