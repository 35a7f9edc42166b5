//! Persisting compiled templates for offline inspection.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::CompiledTemplate;
use crate::errors::{ConfigurationError, Result};

/// Writes compiled templates under a fixed directory.
#[derive(Debug, Clone)]
pub struct TemplateWriter {
    dir: PathBuf,
}

impl TemplateWriter {
    /// Creates a writer rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory templates are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic path for a stack's template.
    ///
    /// Names that are empty or contain a path separator or `..` are
    /// rejected so the file always lands directly under [`Self::dir`].
    pub fn path_for(&self, logical_name: &str) -> Result<PathBuf> {
        if logical_name.is_empty()
            || logical_name.contains(['/', '\\'])
            || logical_name.contains("..")
        {
            return Err(ConfigurationError::new(
                logical_name,
                "stack name cannot be used as a template file name",
            )
            .into());
        }
        Ok(self.dir.join(format!(
            "cloudformation-template-update-additional-stack-{logical_name}.json"
        )))
    }

    /// Writes the template, creating the directory if needed.
    ///
    /// Returns once the file is on disk; callers make remote calls only
    /// after this succeeds.
    pub async fn write(&self, logical_name: &str, template: &CompiledTemplate) -> Result<PathBuf> {
        let path = self.path_for(logical_name)?;
        let body = template.to_pretty()?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, body).await?;
        debug!(stack = %logical_name, path = %path.display(), "Wrote compiled template");
        Ok(path)
    }
}
