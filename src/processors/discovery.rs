//! Target discovery over a mod directory tree

use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::cancel::CancelToken;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::TranslationTarget;

/// Finds translatable XML files under localization folders
#[derive(Debug, Clone)]
pub struct TargetDiscovery {
    allowed_folders: Vec<String>,
    excluded_fragments: Vec<String>,
    extension: String,
}

impl TargetDiscovery {
    /// Create a new discovery with explicit rules
    pub fn new(
        allowed_folders: Vec<String>,
        excluded_fragments: Vec<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            allowed_folders,
            excluded_fragments,
            extension: extension.into(),
        }
    }

    /// Take folder, fragment and extension rules from configuration
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(
            config.allowed_folders.clone(),
            config.excluded_fragments.clone(),
            config.extension.clone(),
        )
    }

    /// Walk `root` and return eligible files in lexical order
    pub fn discover(&self, root: &Path, cancel: &CancelToken) -> Result<Vec<TranslationTarget>> {
        let discovery_error = |message: String| TranslationError::DiscoveryError {
            path: root.display().to_string(),
            message,
        };

        if !root.is_dir() {
            return Err(discovery_error("Not a directory".to_string()));
        }
        std::fs::read_dir(root).map_err(|e| discovery_error(e.to_string()))?;

        let mut targets = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_eligible(root, entry.path()) {
                debug!("Found target: {}", entry.path().display());
                targets.push(TranslationTarget::new(entry.path()));
            }
        }

        info!("Discovered {} targets under {}", targets.len(), root.display());
        Ok(targets)
    }

    /// Check a file path against the folder, exclusion and extension rules
    fn is_eligible(&self, root: &Path, path: &Path) -> bool {
        if !self.has_extension(path) {
            return false;
        }

        let Some(parent) = path.parent() else {
            return false;
        };
        let relative = parent.strip_prefix(root).unwrap_or(parent);

        let under_allowed = relative.components().any(|c| match c {
            Component::Normal(name) => self
                .allowed_folders
                .iter()
                .any(|folder| name.to_str() == Some(folder.as_str())),
            _ => false,
        });
        if !under_allowed {
            return false;
        }

        let relative = relative.to_string_lossy();
        !self
            .excluded_fragments
            .iter()
            .any(|fragment| relative.contains(fragment.as_str()))
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}
