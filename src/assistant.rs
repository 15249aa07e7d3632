//! Text-generation backend abstraction
//!
//! The dashboard ships with a canned assistant; a real backend plugs in by
//! implementing [`Assistant`] with the same request shape.

mod canned;
mod error;

pub use canned::{placeholder_tag, CannedAssistant};
#[allow(unused_imports)] // Public API re-exports
pub use error::{AssistantError, AssistantErrorKind};

use crate::content::{NodePath, Tag};
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for reply and tag generation
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Produce the full reply text for a report query
    async fn respond(&self, query: &str) -> Result<String, AssistantError>;

    /// Produce tags for the node described by `prompt`
    async fn generate_tags(&self, path: &NodePath, prompt: &str)
        -> Result<Vec<Tag>, AssistantError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Assistant + ?Sized> Assistant for Arc<T> {
    async fn respond(&self, query: &str) -> Result<String, AssistantError> {
        (**self).respond(query).await
    }

    async fn generate_tags(
        &self,
        path: &NodePath,
        prompt: &str,
    ) -> Result<Vec<Tag>, AssistantError> {
        (**self).generate_tags(path, prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for assistants
pub struct LoggingAssistant<A> {
    inner: A,
}

impl<A: Assistant> LoggingAssistant<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: Assistant> Assistant for LoggingAssistant<A> {
    async fn respond(&self, query: &str) -> Result<String, AssistantError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(query).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    backend = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    query_chars = query.chars().count(),
                    reply_chars = text.chars().count(),
                    "Reply generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    backend = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Reply generation failed"
                );
            }
        }

        result
    }

    async fn generate_tags(
        &self,
        path: &NodePath,
        prompt: &str,
    ) -> Result<Vec<Tag>, AssistantError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate_tags(path, prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(tags) => {
                tracing::info!(
                    backend = %self.inner.name(),
                    node_id = %path.node_id,
                    duration_ms = %duration.as_millis(),
                    count = tags.len(),
                    "Tags generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    backend = %self.inner.name(),
                    node_id = %path.node_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    "Tag generation failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
