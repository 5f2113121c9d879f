//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Delimiter separating a verbatim key prefix from translatable content
pub const KEY_DELIMITER: &str = "->";

/// A file selected by discovery for translation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationTarget {
    path: PathBuf,
}

impl TranslationTarget {
    /// Wrap a file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TranslationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// One `<tag>text</tag>` span inside a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Opening tag including angle brackets
    pub opening_tag: String,
    /// Text between the tags, still XML-escaped
    pub raw_text: String,
    /// Closing tag including angle brackets
    pub closing_tag: String,
    /// Byte range of the whole span within the file content
    pub span: Range<usize>,
}

impl TextUnit {
    /// Split off the `key->` prefix, if the text carries one
    pub fn split_key(&self) -> Option<(&str, &str)> {
        self.raw_text.split_once(KEY_DELIMITER)
    }

    /// Rebuild the span with a replacement text
    pub fn render(&self, text: &str) -> String {
        format!("{}{}{}", self.opening_tag, text, self.closing_tag)
    }
}

/// Per-file result
#[derive(Debug)]
pub enum TranslationOutcome {
    /// File processed, possibly with some units kept as original
    Translated {
        /// The file
        target: TranslationTarget,
        /// Number of text units found
        units: usize,
        /// Rewritten file content as written to disk
        content: String,
    },
    /// File could not be read or written; left untouched
    Failed {
        /// The file
        target: TranslationTarget,
        /// What went wrong
        error: crate::core::errors::TranslationError,
    },
    /// Not started because the batch was cancelled
    Skipped {
        /// The file
        target: TranslationTarget,
    },
}

impl TranslationOutcome {
    /// The file this outcome is about
    pub fn target(&self) -> &TranslationTarget {
        match self {
            TranslationOutcome::Translated { target, .. }
            | TranslationOutcome::Failed { target, .. }
            | TranslationOutcome::Skipped { target } => target,
        }
    }

    /// True for [`TranslationOutcome::Translated`]
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Translated { .. })
    }
}

/// A file that failed during a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    /// File path; empty if the task died before it could be identified
    pub path: PathBuf,
    /// Error text
    pub message: String,
}

/// Aggregated result of a batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Files discovered
    pub total: usize,
    /// Files translated and written
    pub succeeded: usize,
    /// Files that failed
    pub failed: usize,
    /// Files never started because of cancellation
    pub skipped: usize,
    /// One entry per failed file
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    /// Empty report for `total` files
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Fold a file outcome into the report
    pub fn record(&mut self, outcome: &TranslationOutcome) {
        match outcome {
            TranslationOutcome::Translated { .. } => self.succeeded += 1,
            TranslationOutcome::Failed { target, error } => {
                self.failed += 1;
                self.failures.push(FileFailure {
                    path: target.path().to_path_buf(),
                    message: error.to_string(),
                });
            }
            TranslationOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Nothing failed and nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::TranslationError;

    fn unit(text: &str) -> TextUnit {
        TextUnit {
            opening_tag: "<label>".into(),
            raw_text: text.into(),
            closing_tag: "</label>".into(),
            span: 0..0,
        }
    }

    #[test]
    fn test_split_key_uses_first_delimiter() {
        let u = unit("r_logentry->[INITIATOR] hit -> [RECIPIENT]");
        assert_eq!(
            u.split_key(),
            Some(("r_logentry", "[INITIATOR] hit -> [RECIPIENT]"))
        );
        assert_eq!(unit("plain").split_key(), None);
    }

    #[test]
    fn test_batch_report_counts_outcomes() {
        let mut report = BatchReport::new(3);
        report.record(&TranslationOutcome::Translated {
            target: TranslationTarget::new("a.xml"),
            units: 1,
            content: String::new(),
        });
        report.record(&TranslationOutcome::Failed {
            target: TranslationTarget::new("b.xml"),
            error: TranslationError::FileError {
                path: "b.xml".into(),
                message: "denied".into(),
            },
        });
        report.record(&TranslationOutcome::Skipped {
            target: TranslationTarget::new("c.xml"),
        });

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures[0].path, PathBuf::from("b.xml"));
        assert!(!report.is_clean());
    }
}
