use std::path::Path;

use anyhow::Context;

pub const REPORT_FALLBACK_MARKDOWN: &str = "# An error occurred\n\nThe discrepancy check failed.";

/// Writes the comparison text verbatim, replacing any previous report.
pub fn write_report(path: &Path, report: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    std::fs::write(path, report).with_context(|| format!("failed writing {}", path.display()))
}
