use std::env;
use std::fmt;
use std::path::PathBuf;

use styleaudit_contracts::design::FontMergePolicy;

use crate::http::normalize_api_base;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const FIGMA_TOKEN: &str = "FIGMA_TOKEN";
pub const FIGMA_FILE_KEY: &str = "FILE_KEY";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_FIGMA_API_BASE: &str = "https://api.figma.com/v1";

pub const DEFAULT_GUIDELINE_IMAGE: &str = "guideline.png";
pub const DEFAULT_DESIGN_IMAGE: &str = "design.png";
pub const DEFAULT_REPORT_PATH: &str = "diff_report_hybrid.md";
pub const DEFAULT_DEBUG_PATH: &str = "debug_data.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {} (set them in the environment or .env)", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Everything a run needs, resolved once at startup.
#[derive(Clone)]
pub struct AuditConfig {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub figma_token: String,
    pub figma_file_key: String,
    pub figma_api_base: String,
    pub model: String,
    pub guideline_image: PathBuf,
    pub design_image: PathBuf,
    pub report_path: PathBuf,
    pub debug_path: PathBuf,
    pub merge_policy: FontMergePolicy,
}

impl AuditConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves configuration through `lookup`; every missing required key
    /// is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let openai_api_key = value(OPENAI_API_KEY);
        let figma_token = value(FIGMA_TOKEN);
        let figma_file_key = value(FIGMA_FILE_KEY);
        let (Some(openai_api_key), Some(figma_token), Some(figma_file_key)) =
            (openai_api_key.clone(), figma_token.clone(), figma_file_key.clone())
        else {
            let missing = [
                (OPENAI_API_KEY, openai_api_key.is_none()),
                (FIGMA_TOKEN, figma_token.is_none()),
                (FIGMA_FILE_KEY, figma_file_key.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(key, _)| key)
            .collect();
            return Err(ConfigError::Missing(missing));
        };

        let openai_api_base = value("OPENAI_API_BASE")
            .or_else(|| value("OPENAI_BASE_URL"))
            .map(|raw| normalize_api_base(&raw, DEFAULT_OPENAI_API_BASE, "v1"))
            .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string());
        let figma_api_base = value("FIGMA_API_BASE")
            .map(|raw| normalize_api_base(&raw, DEFAULT_FIGMA_API_BASE, "v1"))
            .unwrap_or_else(|| DEFAULT_FIGMA_API_BASE.to_string());

        Ok(Self {
            openai_api_key,
            openai_api_base,
            figma_token,
            figma_file_key,
            figma_api_base,
            model: value("STYLEAUDIT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            guideline_image: PathBuf::from(DEFAULT_GUIDELINE_IMAGE),
            design_image: PathBuf::from(DEFAULT_DESIGN_IMAGE),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            debug_path: PathBuf::from(DEFAULT_DEBUG_PATH),
            merge_policy: FontMergePolicy::default(),
        })
    }
}

impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("openai_api_key", &"<redacted>")
            .field("openai_api_base", &self.openai_api_base)
            .field("figma_token", &"<redacted>")
            .field("figma_file_key", &self.figma_file_key)
            .field("figma_api_base", &self.figma_api_base)
            .field("model", &self.model)
            .field("guideline_image", &self.guideline_image)
            .field("design_image", &self.design_image)
            .field("report_path", &self.report_path)
            .field("debug_path", &self.debug_path)
            .field("merge_policy", &self.merge_policy)
            .finish()
    }
}
