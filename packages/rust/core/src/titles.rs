//! Batch HTML title extraction.
//!
//! Scans a directory of HTML files, extracts the most prominent heading
//! from each (`h1` first, then `h2`..`h6`, then `<title>`), and produces
//! a JSON report of filename → title pairs. Per-file failures are
//! recorded in the report, never fatal.

use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use opsplit_shared::{OpsplitError, Result};

/// Heading tags in priority order; `<title>` is the last resort.
const TITLE_TAGS: [&str; 7] = ["h1", "h2", "h3", "h4", "h5", "h6", "title"];

/// One scanned file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleEntry {
    /// Path relative to the scanned directory.
    pub filename: String,
    /// Extracted title, empty when none was found.
    pub title: String,
    pub full_path: String,
    /// Read/parse failure, when one occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The report persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleReport {
    pub total_files: usize,
    pub files_with_title: usize,
    pub files: Vec<TitleEntry>,
}

/// Extract the most prominent title from an HTML document.
pub fn extract_max_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    for tag in TITLE_TAGS {
        let selector = Selector::parse(tag).unwrap();
        if let Some(element) = doc.select(&selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

/// Scan `dir` for `*.html` / `*.htm` files and extract each title.
///
/// Files are visited in path order. A file that cannot be read gets an
/// entry with an empty title and the error message; only a missing or
/// non-directory path is fatal.
#[instrument(skip_all, fields(dir = %dir.as_ref().display(), recursive))]
pub fn scan_directory(dir: impl AsRef<Path>, recursive: bool) -> Result<TitleReport> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Err(OpsplitError::config(format!(
            "directory does not exist: {}",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(OpsplitError::config(format!(
            "path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    collect_html_files(dir, recursive, &mut files)?;
    files.sort();

    if files.is_empty() {
        warn!(dir = %dir.display(), "no HTML files found");
    }

    let mut entries: Vec<TitleEntry> = Vec::with_capacity(files.len());

    for path in &files {
        let filename = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let full_path = path.to_string_lossy().to_string();

        match std::fs::read_to_string(path) {
            Ok(html) => {
                let title = extract_max_title(&html).unwrap_or_default();
                if title.is_empty() {
                    debug!(file = %filename, "no title found");
                }
                entries.push(TitleEntry {
                    filename,
                    title,
                    full_path,
                    error: None,
                });
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "failed to read HTML file");
                entries.push(TitleEntry {
                    filename,
                    title: String::new(),
                    full_path,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let files_with_title = entries.iter().filter(|e| !e.title.is_empty()).count();

    info!(
        total = entries.len(),
        with_title = files_with_title,
        "title scan complete"
    );

    Ok(TitleReport {
        total_files: entries.len(),
        files_with_title,
        files: entries,
    })
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_report(report: &TitleReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| OpsplitError::io(parent, e))?;
        }
    }

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| OpsplitError::validation(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json).map_err(|e| OpsplitError::io(path, e))?;

    Ok(())
}

fn collect_html_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| OpsplitError::io(dir, e))? {
        let path = entry.map_err(|e| OpsplitError::io(dir, e))?.path();

        if path.is_dir() {
            if recursive {
                collect_html_files(&path, true, out)?;
            }
            continue;
        }

        if path
            .extension()
            .is_some_and(|ext| ext == "html" || ext == "htm")
        {
            out.push(path);
        }
    }
    Ok(())
}
