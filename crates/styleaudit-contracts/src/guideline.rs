pub const GUIDELINE_FALLBACK_JSON: &str = r#"{"colors": {}, "fonts": {}, "fontSizes": {}}"#;

/// Guideline extraction as returned by the model. Kept as opaque text; only
/// the comparison prompt reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidelineDocument {
    text: String,
}

impl GuidelineDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn fallback() -> Self {
        Self::new(GUIDELINE_FALLBACK_JSON)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::GuidelineDocument;

    #[test]
    fn fallback_is_an_empty_skeleton() -> anyhow::Result<()> {
        let parsed: Value = serde_json::from_str(GuidelineDocument::fallback().as_str())?;
        assert_eq!(parsed, json!({"colors": {}, "fonts": {}, "fontSizes": {}}));
        Ok(())
    }

    #[test]
    fn model_text_is_kept_verbatim() {
        let text = "```json\n{\"colors\": {\"textColor\": \"#333\"}}\n```";
        assert_eq!(GuidelineDocument::new(text).as_str(), text);
    }
}
