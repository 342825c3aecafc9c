use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

pub const UNKNOWN: &str = "unknown";

/// Typography declared on a design-tool text node.
///
/// Present fields are kept exactly as the design tool sent them; absent
/// fields serialize as the literal `"unknown"`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub font_size: Option<Value>,
    pub font_family: Option<Value>,
}

impl TextStyle {
    pub fn new(font_size: impl Into<Number>, font_family: impl Into<String>) -> Self {
        Self {
            font_size: Some(Value::Number(font_size.into())),
            font_family: Some(Value::String(font_family.into())),
        }
    }

    /// Reads `fontSize` / `fontFamily` from a style object. Only a missing
    /// key counts as unknown.
    pub fn from_style_value(style: Option<&Value>) -> Self {
        let Some(style) = style.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            font_size: style.get("fontSize").cloned(),
            font_family: style.get("fontFamily").cloned(),
        }
    }

    pub fn font_size_value(&self) -> Value {
        or_unknown(self.font_size.as_ref())
    }

    pub fn font_family_value(&self) -> Value {
        or_unknown(self.font_family.as_ref())
    }

    pub fn to_value(&self) -> Value {
        let mut record = Map::new();
        record.insert("fontSize".to_string(), self.font_size_value());
        record.insert("fontFamily".to_string(), self.font_family_value());
        Value::Object(record)
    }
}

fn or_unknown(value: Option<&Value>) -> Value {
    value
        .cloned()
        .unwrap_or_else(|| Value::String(UNKNOWN.to_string()))
}

fn hint_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Serialize for TextStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("fontSize", &self.font_size_value())?;
        map.serialize_entry("fontFamily", &self.font_family_value())?;
        map.end()
    }
}

/// Literal text content -> declared typography, in first-seen order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FontInfoMap {
    entries: IndexMap<String, TextStyle>,
}

impl FontInfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; the key keeps the position of its first insertion.
    pub fn insert(&mut self, text: impl Into<String>, style: TextStyle) -> Option<TextStyle> {
        self.entries.insert(text.into(), style)
    }

    pub fn get(&self, text: &str) -> Option<&TextStyle> {
        self.entries.get(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TextStyle)> {
        self.entries
            .iter()
            .map(|(text, style)| (text.as_str(), style))
    }

    /// One line per entry, used as a prompt hint.
    pub fn render_hint(&self) -> String {
        self.iter()
            .map(|(text, style)| {
                format!(
                    "- text: '{}' -> font size: {}, font family: {}",
                    text,
                    hint_label(&style.font_size_value()),
                    hint_label(&style.font_family_value())
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FontInfoMap, TextStyle};

    #[test]
    fn text_style_serializes_unknown_sentinels() -> anyhow::Result<()> {
        let style = TextStyle::from_style_value(Some(&json!({"fontWeight": 700})));
        assert_eq!(
            serde_json::to_value(&style)?,
            json!({"fontSize": "unknown", "fontFamily": "unknown"})
        );

        let style = TextStyle::from_style_value(Some(&json!({
            "fontSize": 24,
            "fontFamily": "Poppins",
        })));
        assert_eq!(
            style.to_value(),
            json!({"fontSize": 24, "fontFamily": "Poppins"})
        );
        Ok(())
    }

    #[test]
    fn insert_replaces_value_but_keeps_first_position() {
        let mut map = FontInfoMap::new();
        map.insert("Hello", TextStyle::new(12, "Noto Sans JP"));
        map.insert("World", TextStyle::new(14, "Poppins"));
        map.insert("Hello", TextStyle::new(32, "Poppins"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Hello"), Some(&TextStyle::new(32, "Poppins")));
        let keys: Vec<&str> = map.iter().map(|(text, _)| text).collect();
        assert_eq!(keys, vec!["Hello", "World"]);
    }

    #[test]
    fn render_hint_lists_every_entry() {
        let mut map = FontInfoMap::new();
        map.insert("Sign up", TextStyle::new(16, "Poppins"));
        map.insert("Welcome", TextStyle::default());

        assert_eq!(
            map.render_hint(),
            "- text: 'Sign up' -> font size: 16, font family: Poppins\n\
             - text: 'Welcome' -> font size: unknown, font family: unknown"
        );
    }

    #[test]
    fn lookups_are_exact() {
        let mut map = FontInfoMap::new();
        map.insert("Hello", TextStyle::new(24, "Poppins"));
        assert!(map.get("Hello").is_some());
        assert!(map.get("hello").is_none());
        assert!(map.get("Hello ").is_none());
    }

    #[test]
    fn present_style_values_are_kept_verbatim() -> anyhow::Result<()> {
        let padded = TextStyle::from_style_value(Some(&json!({
            "fontFamily": " Poppins ",
            "fontSize": "16",
        })));
        let blank = TextStyle::from_style_value(Some(&json!({
            "fontFamily": "",
            "fontSize": null,
        })));

        let mut map = FontInfoMap::new();
        map.insert("A", padded);
        map.insert("B", blank);

        assert_eq!(
            serde_json::to_value(&map)?,
            json!({
                "A": {"fontSize": "16", "fontFamily": " Poppins "},
                "B": {"fontSize": null, "fontFamily": ""},
            })
        );
        assert_eq!(
            map.render_hint(),
            "- text: 'A' -> font size: 16, font family:  Poppins \n\
             - text: 'B' -> font size: null, font family: "
        );
        Ok(())
    }
}
