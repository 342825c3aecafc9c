use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::design::DesignDraft;
use crate::events::now_utc_iso;
use crate::fonts::FontInfoMap;
use crate::guideline::GuidelineDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    EncodeImages,
    FigmaStyles,
    Guideline,
    Design,
    DesignParse,
    Compare,
    WriteReport,
    WriteDebug,
}

impl AuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EncodeImages => "encode_images",
            Self::FigmaStyles => "figma_styles",
            Self::Guideline => "guideline",
            Self::Design => "design",
            Self::DesignParse => "design_parse",
            Self::Compare => "compare",
            Self::WriteReport => "write_report",
            Self::WriteDebug => "write_debug",
        }
    }
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage that degraded to its placeholder value, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFallback {
    pub stage: AuditStage,
    pub reason: String,
}

/// Snapshot of every intermediate artifact of one audit run.
#[derive(Debug, Clone, Copy)]
pub struct DebugBundle<'a> {
    pub guideline: &'a GuidelineDocument,
    pub design_final: &'a DesignDraft,
    pub font_info_map: &'a FontInfoMap,
    pub fallbacks: &'a [StageFallback],
}

impl DebugBundle<'_> {
    pub fn to_value(&self) -> anyhow::Result<Value> {
        let mut payload = Map::new();
        payload.insert(
            "guideline".to_string(),
            Value::String(self.guideline.as_str().to_string()),
        );
        payload.insert("design_final".to_string(), self.design_final.to_value());
        payload.insert(
            "font_info_map".to_string(),
            serde_json::to_value(self.font_info_map)?,
        );
        payload.insert(
            "fallbacks".to_string(),
            serde_json::to_value(self.fallbacks)?,
        );
        payload.insert("ts".to_string(), Value::String(now_utc_iso()));
        Ok(Value::Object(payload))
    }
}

pub fn write_debug_bundle(path: &Path, bundle: &DebugBundle<'_>) -> anyhow::Result<()> {
    let payload = bundle.to_value()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&payload)?)
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}
