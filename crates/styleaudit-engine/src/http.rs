use anyhow::{bail, Context, Result};
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// JSON body of a successful response. Non-2xx statuses become errors that
/// carry a bounded excerpt of what the service said.
pub(crate) fn json_body(service: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .with_context(|| format!("{service} response body could not be read"))?;
    if !status.is_success() {
        bail!(
            "{service} request failed ({}): {}",
            status.as_u16(),
            truncate_text(body.trim(), ERROR_BODY_MAX_CHARS)
        );
    }
    serde_json::from_str(&body).with_context(|| format!("{service} returned a non-JSON body"))
}

/// Bare hosts get `/{version_path}` appended; blank input means the default.
pub(crate) fn normalize_api_base(raw: &str, default_base: &str, version_path: &str) -> String {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return default_base.to_string();
    }
    match reqwest::Url::parse(base) {
        Ok(url) if url.path().trim_matches('/').is_empty() => format!("{base}/{version_path}"),
        _ => base.to_string(),
    }
}

/// Flattens an error and its causes into one line, as recorded for a stage
/// fallback.
pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut causes: Vec<String> = err
        .chain()
        .map(|cause| cause.to_string().trim().to_string())
        .filter(|cause| !cause.is_empty())
        .collect();
    causes.dedup();
    truncate_text(&causes.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &value[..cut]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{error_chain_text, normalize_api_base, truncate_text};

    #[test]
    fn fallback_reason_lists_each_cause_once() {
        let err = anyhow::anyhow!("Figma request failed (403): Invalid token")
            .context("Figma request failed (403): Invalid token")
            .context("text styles unavailable");
        assert_eq!(
            error_chain_text(&err, 512),
            "text styles unavailable | caused by: Figma request failed (403): Invalid token"
        );
    }

    #[test]
    fn fallback_reason_is_bounded() {
        let err = anyhow::anyhow!("OpenAI request failed (500): {}", "x".repeat(600));
        let reason = error_chain_text(&err, 40);
        assert_eq!(reason.chars().count(), 41);
        assert!(reason.starts_with("OpenAI request failed (500): xxx"));
        assert!(reason.ends_with('…'));
    }

    #[test]
    fn api_base_gets_version_path_when_bare() {
        assert_eq!(
            normalize_api_base("https://proxy.test/", "https://api.openai.com/v1", "v1"),
            "https://proxy.test/v1"
        );
        assert_eq!(
            normalize_api_base("https://proxy.test/openai/v1/", "unused", "v1"),
            "https://proxy.test/openai/v1"
        );
        assert_eq!(
            normalize_api_base("  ", "https://api.figma.com/v1", "v1"),
            "https://api.figma.com/v1"
        );
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_text("お問い合わせ", 3), "お問い…");
        assert_eq!(truncate_text("Hello", 5), "Hello");
    }
}
