//! Sources of the initial content tree

use super::{default_tree, ContentError, ContentTree, Stage};
use std::path::PathBuf;

/// Supplies the content tree at session start
pub trait ContentProvider: Send + Sync {
    fn load(&self) -> Result<ContentTree, ContentError>;

    /// Short description for startup logging
    fn describe(&self) -> String;
}

/// Serves the built-in review pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContentProvider;

impl ContentProvider for StaticContentProvider {
    fn load(&self) -> Result<ContentTree, ContentError> {
        let tree = default_tree();
        tree.validate()?;
        Ok(tree)
    }

    fn describe(&self) -> String {
        "built-in".to_string()
    }
}

/// Reads a JSON array of stages
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContentProvider for JsonFileProvider {
    fn load(&self) -> Result<ContentTree, ContentError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ContentError::Io {
            path: self.path.clone(),
            source,
        })?;
        let stages: Vec<Stage> =
            serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
                path: self.path.clone(),
                source,
            })?;
        ContentTree::new(stages)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Pick a provider from an optional content path
pub fn provider_from_config(path: Option<&PathBuf>) -> Box<dyn ContentProvider> {
    match path {
        Some(path) => Box::new(JsonFileProvider::new(path.clone())),
        None => Box::new(StaticContentProvider),
    }
}
