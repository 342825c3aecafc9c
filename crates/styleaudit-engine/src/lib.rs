pub mod config;
pub mod figma;
mod http;
pub mod image;
pub mod openai;
pub mod prompts;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use styleaudit_contracts::design::DesignDraft;
use styleaudit_contracts::events::{EventPayload, EventWriter};
use styleaudit_contracts::fonts::FontInfoMap;
use styleaudit_contracts::guideline::GuidelineDocument;
use styleaudit_contracts::runs::debug::{write_debug_bundle, AuditStage, DebugBundle, StageFallback};
use styleaudit_contracts::runs::report::{write_report, REPORT_FALLBACK_MARKDOWN};

use crate::config::AuditConfig;
use crate::figma::{fetch_text_styles, DocumentSource, StyleCollection};
use crate::image::{encode_image, EncodedImage};
use crate::openai::{ChatModel, ChatRequest};

pub use crate::http::error_chain_text;

const FALLBACK_REASON_MAX_CHARS: usize = 512;

/// Everything one audit run produced, including which stages degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub guideline: GuidelineDocument,
    pub design: DesignDraft,
    pub fonts: FontInfoMap,
    pub report: String,
    pub merged_elements: usize,
    pub fallbacks: Vec<StageFallback>,
    pub report_written: bool,
    pub debug_written: bool,
    /// First failure appending to the event log, if any.
    pub event_log_error: Option<String>,
}

impl AuditOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.fallbacks.is_empty()
    }

    pub fn fell_back(&self, stage: AuditStage) -> bool {
        self.fallbacks.iter().any(|fallback| fallback.stage == stage)
    }
}

pub fn extract_guideline(
    chat: &dyn ChatModel,
    config: &AuditConfig,
    image: &EncodedImage,
) -> Result<GuidelineDocument> {
    let text = chat.complete(&ChatRequest {
        model: config.model.clone(),
        system: prompts::guideline_system_instruction().to_string(),
        user_text: prompts::guideline_instruction().to_string(),
        image_data_url: Some(image.data_url()),
    })?;
    Ok(GuidelineDocument::new(text))
}

pub fn extract_design(
    chat: &dyn ChatModel,
    config: &AuditConfig,
    image: &EncodedImage,
    fonts: &FontInfoMap,
) -> Result<DesignDraft> {
    let text = chat.complete(&ChatRequest {
        model: config.model.clone(),
        system: prompts::design_system_instruction().to_string(),
        user_text: prompts::design_instruction(&prompts::font_hint(fonts)),
        image_data_url: Some(image.data_url()),
    })?;
    Ok(DesignDraft::Raw(text))
}

pub fn compare(
    chat: &dyn ChatModel,
    config: &AuditConfig,
    guideline: &GuidelineDocument,
    design: &DesignDraft,
) -> Result<String> {
    chat.complete(&ChatRequest {
        model: config.model.clone(),
        system: prompts::compare_system_instruction().to_string(),
        user_text: prompts::compare_instruction(guideline.as_str(), &design.to_pretty_json()),
        image_data_url: None,
    })
}

/// Sequential audit: every remote stage may fail and is replaced by its
/// placeholder; only configuration and missing input images abort.
pub struct AuditPipeline {
    config: AuditConfig,
    chat: Box<dyn ChatModel>,
    documents: Box<dyn DocumentSource>,
    events: EventWriter,
}

impl AuditPipeline {
    pub fn new(
        config: AuditConfig,
        chat: Box<dyn ChatModel>,
        documents: Box<dyn DocumentSource>,
        events: EventWriter,
    ) -> Self {
        Self {
            config,
            chat,
            documents,
            events,
        }
    }

    pub fn run(&self) -> Result<AuditOutcome> {
        let config = &self.config;
        let mut log = StageLog::new(&self.events);
        log.emit(
            "run_started",
            map_object(json!({
                "guideline_image": config.guideline_image.to_string_lossy(),
                "design_image": config.design_image.to_string_lossy(),
                "model": config.model,
                "merge_policy": config.merge_policy.to_string(),
            })),
        );

        log.started(AuditStage::EncodeImages, EventPayload::new());
        let guideline_image = encode_image(&config.guideline_image)
            .context("guideline image could not be loaded")?;
        let design_image =
            encode_image(&config.design_image).context("design image could not be loaded")?;
        log.completed(AuditStage::EncodeImages, EventPayload::new());

        log.started(
            AuditStage::FigmaStyles,
            map_object(json!({"file_key": config.figma_file_key})),
        );
        let fonts = match fetch_text_styles(self.documents.as_ref(), config) {
            Ok(StyleCollection {
                fonts,
                top_level_nodes,
            }) => {
                for (text, style) in fonts.iter() {
                    log.emit(
                        "text_style_found",
                        map_object(json!({
                            "text": text,
                            "font_size": style.font_size_value(),
                            "font_family": style.font_family_value(),
                        })),
                    );
                }
                log.completed(
                    AuditStage::FigmaStyles,
                    map_object(json!({
                        "top_level_nodes": top_level_nodes,
                        "text_styles": fonts.len(),
                    })),
                );
                fonts
            }
            Err(err) => {
                log.fall_back(AuditStage::FigmaStyles, &err);
                FontInfoMap::new()
            }
        };

        log.started(AuditStage::Guideline, EventPayload::new());
        let guideline = match extract_guideline(self.chat.as_ref(), config, &guideline_image) {
            Ok(guideline) => {
                log.completed(AuditStage::Guideline, EventPayload::new());
                guideline
            }
            Err(err) => {
                log.fall_back(AuditStage::Guideline, &err);
                GuidelineDocument::fallback()
            }
        };

        let font_hint_source = if fonts.is_empty() { "generic" } else { "figma" };
        log.started(
            AuditStage::Design,
            map_object(json!({"font_hint": font_hint_source})),
        );
        let draft = match extract_design(self.chat.as_ref(), config, &design_image, &fonts) {
            Ok(draft) => {
                log.completed(AuditStage::Design, EventPayload::new());
                draft
            }
            Err(err) => {
                log.fall_back(AuditStage::Design, &err);
                DesignDraft::fallback()
            }
        };

        log.started(AuditStage::DesignParse, EventPayload::new());
        let mut design = match draft.parse() {
            Ok(parsed) => parsed,
            Err((raw, err)) => {
                log.fall_back(AuditStage::DesignParse, &anyhow::Error::from(err));
                raw
            }
        };
        let merged_elements = design.merge_font_sizes(&fonts, config.merge_policy);
        if design.is_parsed() {
            log.completed(
                AuditStage::DesignParse,
                map_object(json!({"merged_elements": merged_elements})),
            );
        }

        log.started(AuditStage::Compare, EventPayload::new());
        let report = match compare(self.chat.as_ref(), config, &guideline, &design) {
            Ok(report) => {
                log.completed(AuditStage::Compare, EventPayload::new());
                report
            }
            Err(err) => {
                log.fall_back(AuditStage::Compare, &err);
                REPORT_FALLBACK_MARKDOWN.to_string()
            }
        };

        let report_written = log.write_output(AuditStage::WriteReport, &config.report_path, |path| {
            write_report(path, &report)
        });
        let bundle_fallbacks = log.fallbacks.clone();
        let debug_written = log.write_output(AuditStage::WriteDebug, &config.debug_path, |path| {
            write_debug_bundle(
                path,
                &DebugBundle {
                    guideline: &guideline,
                    design_final: &design,
                    font_info_map: &fonts,
                    fallbacks: &bundle_fallbacks,
                },
            )
        });

        let fallback_count = log.fallbacks.len();
        log.emit(
            "run_finished",
            map_object(json!({
                "fallbacks": fallback_count,
                "report_written": report_written,
                "debug_written": debug_written,
            })),
        );

        Ok(AuditOutcome {
            guideline,
            design,
            fonts,
            report,
            merged_elements,
            fallbacks: log.fallbacks,
            report_written,
            debug_written,
            event_log_error: log.event_log_error,
        })
    }
}

/// Per-run bookkeeping. Event-log failures never stop a run: the first one
/// is kept for the outcome and observers keep receiving events.
struct StageLog<'a> {
    events: &'a EventWriter,
    fallbacks: Vec<StageFallback>,
    event_log_error: Option<String>,
}

impl<'a> StageLog<'a> {
    fn new(events: &'a EventWriter) -> Self {
        Self {
            events,
            fallbacks: Vec::new(),
            event_log_error: None,
        }
    }

    fn emit(&mut self, event_type: &str, payload: EventPayload) {
        if let Err(err) = self.events.emit(event_type, payload) {
            if self.event_log_error.is_none() {
                self.event_log_error = Some(error_chain_text(&err, FALLBACK_REASON_MAX_CHARS));
            }
        }
    }

    fn started(&mut self, stage: AuditStage, payload: EventPayload) {
        self.emit_stage("stage_started", stage, payload);
    }

    fn completed(&mut self, stage: AuditStage, payload: EventPayload) {
        self.emit_stage("stage_completed", stage, payload);
    }

    fn fall_back(&mut self, stage: AuditStage, err: &anyhow::Error) {
        let reason = error_chain_text(err, FALLBACK_REASON_MAX_CHARS);
        self.emit_stage(
            "stage_fallback",
            stage,
            map_object(json!({"reason": reason})),
        );
        self.fallbacks.push(StageFallback { stage, reason });
    }

    fn write_output<F>(&mut self, stage: AuditStage, path: &Path, write: F) -> bool
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        match write(path) {
            Ok(()) => {
                self.emit(
                    "artifact_written",
                    map_object(json!({
                        "stage": stage.as_str(),
                        "path": path.to_string_lossy(),
                    })),
                );
                true
            }
            Err(err) => {
                self.fall_back(stage, &err);
                false
            }
        }
    }

    fn emit_stage(&mut self, event_type: &str, stage: AuditStage, payload: EventPayload) {
        let mut event = EventPayload::new();
        event.insert("stage".to_string(), Value::String(stage.as_str().to_string()));
        event.extend(payload);
        self.emit(event_type, event);
    }
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
