//! Canned assistant: fixed report answer and placeholder tags

use super::{Assistant, AssistantError};
use crate::content::{NodePath, Tag};
use async_trait::async_trait;
use std::time::Duration;

/// Reply given to every report query
pub const SAMPLE_RESPONSE: &str = "Based on the analysis of G2 Enterprise Reviews for June 2024, there are several key insights:\n\n1. Enterprise security has become a primary selection factor, with 45% of technical decision makers prioritizing security features.\n\n2. API capabilities are increasingly driving technical evaluation, showing a 15% increase from the previous quarter.\n\n3. Integration depth is becoming more critical, with 38% of reviews mentioning integration capabilities.";

/// Placeholder produced for every prompt. The prompt text is not consulted.
pub fn placeholder_tag(id: impl Into<String>) -> Tag {
    Tag::new(id, "Generated Tag", "AI-generated tag based on the prompt")
}

/// Stand-in backend. `tag_delay` simulates generation latency.
#[derive(Debug, Clone)]
pub struct CannedAssistant {
    tag_delay: Duration,
}

impl CannedAssistant {
    pub fn new(tag_delay: Duration) -> Self {
        Self { tag_delay }
    }
}

#[async_trait]
impl Assistant for CannedAssistant {
    async fn respond(&self, query: &str) -> Result<String, AssistantError> {
        if query.trim().is_empty() {
            return Err(AssistantError::invalid_request("query is empty"));
        }
        Ok(SAMPLE_RESPONSE.to_string())
    }

    async fn generate_tags(
        &self,
        _path: &NodePath,
        _prompt: &str,
    ) -> Result<Vec<Tag>, AssistantError> {
        if !self.tag_delay.is_zero() {
            tokio::time::sleep(self.tag_delay).await;
        }
        Ok(vec![placeholder_tag(uuid::Uuid::new_v4().to_string())])
    }

    fn name(&self) -> &str {
        "canned"
    }
}
