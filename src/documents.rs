//! Allow-listed source document fetching for the content stage.
//!
//! The fetch stage reads a fixed set of reference documents and combines them
//! into the raw material for script drafting. Failures are reported as text in
//! the tool result so the stage can see and react to them; this module never
//! returns an `Err` to its caller.

use crate::config::DocumentSettings;
use std::path::PathBuf;
use tracing::debug;

/// Reads source documents from an allow-listed directory.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    dir: PathBuf,
    allowed_files: Vec<String>,
    max_chars: usize,
}

impl DocumentSource {
    /// Create a document source from settings.
    pub fn new(dir: PathBuf, settings: &DocumentSettings) -> Self {
        Self {
            dir,
            allowed_files: settings.allowed_files.clone(),
            max_chars: settings.max_chars,
        }
    }

    /// The filenames the fetch stage may request.
    pub fn allowed_files(&self) -> &[String] {
        &self.allowed_files
    }

    /// Fetch a document by filename.
    ///
    /// Content longer than the configured ceiling is truncated with a marker
    /// stating the original size; this keeps downstream stage inputs within
    /// token limits. Disallowed names, missing files, and read failures all
    /// produce a descriptive string instead of an error.
    pub fn fetch(&self, filename: &str) -> String {
        if !self.allowed_files.iter().any(|f| f == filename) {
            return format!(
                "Error: File '{}' is not an allowed source. Please use one of {:?}.",
                filename, self.allowed_files
            );
        }

        let path = self.dir.join(filename);
        debug!("Fetching document {}", path.display());

        match std::fs::read_to_string(&path) {
            Ok(content) => truncate_with_marker(&content, self.max_chars),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => format!(
                "Error: File '{}' not found at '{}'.",
                filename,
                path.display()
            ),
            Err(e) => format!("An error occurred while fetching {}: {}", filename, e),
        }
    }
}

/// Truncate content to `max_chars` characters, appending a marker with the
/// original size. Counts characters rather than bytes so multi-byte text
/// never splits mid-character.
fn truncate_with_marker(content: &str, max_chars: usize) -> String {
    let total_chars = content.chars().count();
    if total_chars <= max_chars {
        return content.to_string();
    }

    let truncated: String = content.chars().take(max_chars).collect();
    format!(
        "{}\n[...content truncated, original size {} chars...]",
        truncated, total_chars
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentSettings;

    fn source_in(dir: &std::path::Path) -> DocumentSource {
        DocumentSource::new(dir.to_path_buf(), &DocumentSettings::default())
    }

    #[test]
    fn test_disallowed_filename_names_allowed_set() {
        let tmp = tempfile::tempdir().unwrap();
        let source = source_in(tmp.path());

        let result = source.fetch("not-allowed.txt");
        assert!(result.starts_with("Error:"));
        assert!(result.contains("investopedia.txt"));
        assert!(result.contains("kremp.txt"));
        assert!(result.contains("wikipedia.txt"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let tmp = tempfile::tempdir().unwrap();
        let source = source_in(tmp.path());

        let result = source.fetch("wikipedia.txt");
        assert!(result.contains("not found"));
        assert!(result.contains("wikipedia.txt"));
    }

    #[test]
    fn test_fetch_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("kremp.txt"), "tulip prices rose").unwrap();
        let source = source_in(tmp.path());

        let first = source.fetch("kremp.txt");
        let second = source.fetch("kremp.txt");
        assert_eq!(first, "tulip prices rose");
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncation_marker_states_original_size() {
        let content = "x".repeat(100);
        let result = truncate_with_marker(&content, 10);
        assert!(result.starts_with(&"x".repeat(10)));
        assert!(result.contains("original size 100 chars"));

        // Truncation is deterministic
        assert_eq!(result, truncate_with_marker(&content, 10));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let content = "æøå".repeat(10);
        let result = truncate_with_marker(&content, 5);
        assert!(result.starts_with("æøåæø"));
        assert!(result.contains("original size 30 chars"));
    }

    #[test]
    fn test_short_content_untouched() {
        assert_eq!(truncate_with_marker("short", 100), "short");
    }
}
