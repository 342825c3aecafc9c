use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

pub const SNIPPET_MAX_CHARS: usize = 200;

const FENCED_JSON_PATTERN: &str = r"(?s)```json\s*(.*?)\s*```";

#[derive(Debug, thiserror::Error)]
pub enum JsonExtractError {
    #[error("no JSON found in model output")]
    NotFound,
    #[error("invalid JSON in model output: {source}; candidate starts with: {snippet}")]
    Parse {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Locates and parses the JSON embedded in free-form model output.
///
/// A ```json fenced block wins; otherwise the span from the first `{` to the
/// last `}` is used.
pub fn extract_json(text: &str) -> Result<Value, JsonExtractError> {
    let candidate = fenced_json_block(text)
        .or_else(|| brace_span(text))
        .ok_or(JsonExtractError::NotFound)?;
    serde_json::from_str(candidate).map_err(|source| JsonExtractError::Parse {
        snippet: candidate.chars().take(SNIPPET_MAX_CHARS).collect(),
        source,
    })
}

fn fenced_json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(FENCED_JSON_PATTERN).expect("fenced JSON pattern must compile")
    })
}

fn fenced_json_block(text: &str) -> Option<&str> {
    fenced_json_pattern()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_json, fenced_json_pattern, JsonExtractError, SNIPPET_MAX_CHARS};

    #[test]
    fn fenced_pattern_is_compiled_once() {
        assert!(std::ptr::eq(fenced_json_pattern(), fenced_json_pattern()));
        assert!(fenced_json_pattern().is_match("```json\n{}\n```"));
    }

    #[test]
    fn fenced_block_is_preferred() -> anyhow::Result<()> {
        let text = "Here you go:\n```json\n{\"a\":1}\n```\nand also {\"b\": 2}";
        assert_eq!(extract_json(text)?, json!({"a": 1}));
        Ok(())
    }

    #[test]
    fn bare_object_is_found_between_outer_braces() -> anyhow::Result<()> {
        assert_eq!(extract_json("prefix {\"a\":1} suffix")?, json!({"a": 1}));
        assert_eq!(
            extract_json("{\"sections\": [{\"elements\": []}]} trailing")?,
            json!({"sections": [{"elements": []}]})
        );
        Ok(())
    }

    #[test]
    fn text_without_braces_is_not_found() {
        let err = extract_json("I could not read the image.").err();
        assert!(matches!(err, Some(JsonExtractError::NotFound)));

        let err = extract_json("} backwards {").err();
        assert!(matches!(err, Some(JsonExtractError::NotFound)));
    }

    #[test]
    fn malformed_candidate_reports_truncated_snippet() {
        let long_value = "x".repeat(400);
        let text = format!("```json\n{{\"a\": {long_value}\n```");
        match extract_json(&text) {
            Err(JsonExtractError::Parse { snippet, .. }) => {
                assert_eq!(snippet.chars().count(), SNIPPET_MAX_CHARS);
                assert!(snippet.starts_with("{\"a\": xxx"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unlabelled_fence_falls_back_to_braces() -> anyhow::Result<()> {
        let text = "```\n{\"colors\": {\"text\": \"#333333\"}}\n```";
        assert_eq!(
            extract_json(text)?,
            json!({"colors": {"text": "#333333"}})
        );
        Ok(())
    }
}
