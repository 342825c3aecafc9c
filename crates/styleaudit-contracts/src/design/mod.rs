mod draft;
mod extract;

pub use draft::{merge_font_sizes, DesignDraft, FontMergePolicy, DESIGN_FALLBACK_JSON};
pub use extract::{extract_json, JsonExtractError, SNIPPET_MAX_CHARS};
