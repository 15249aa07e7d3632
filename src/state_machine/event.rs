//! Events that can occur in a session

use crate::content::{NodePath, Tag};
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Selection events
    SelectStage {
        stage_id: Option<String>,
    },
    SelectStep {
        step_id: String,
    },
    SelectNode {
        node_id: String,
    },
    DeselectNode,

    // Tag editing
    /// Edit-button press: opens the tag, or closes it if already open
    ToggleTagEdit {
        tag_id: String,
    },
    CommitTagEdit {
        tag_id: String,
        description: String,
    },

    // Conversation events
    QueryInput {
        text: String,
    },
    SubmitQuery {
        message_id: String,
        text: String,
        sent_at: DateTime<Utc>,
    },
    CancelReveal,

    // Assistant events
    ResponseReady {
        /// Id of the query message this reply answers
        request_id: String,
        message_id: String,
        text: String,
        started_at: DateTime<Utc>,
    },
    ResponseFailed {
        request_id: String,
        message: String,
    },
    RevealChunk {
        message_id: String,
        chunk: char,
    },
    RevealComplete {
        message_id: String,
    },

    // Tag generation
    SubmitPrompt {
        node_id: String,
        prompt: String,
    },
    CancelTagGeneration {
        node_id: String,
    },
    TagsGenerated {
        path: NodePath,
        tags: Vec<Tag>,
    },
    TagGenerationFailed {
        message: String,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::SelectStage { .. } => "select_stage",
            Event::SelectStep { .. } => "select_step",
            Event::SelectNode { .. } => "select_node",
            Event::DeselectNode => "deselect_node",
            Event::ToggleTagEdit { .. } => "toggle_tag_edit",
            Event::CommitTagEdit { .. } => "commit_tag_edit",
            Event::QueryInput { .. } => "query_input",
            Event::SubmitQuery { .. } => "submit_query",
            Event::CancelReveal => "cancel_reveal",
            Event::ResponseReady { .. } => "response_ready",
            Event::ResponseFailed { .. } => "response_failed",
            Event::RevealChunk { .. } => "reveal_chunk",
            Event::RevealComplete { .. } => "reveal_complete",
            Event::SubmitPrompt { .. } => "submit_prompt",
            Event::CancelTagGeneration { .. } => "cancel_tag_generation",
            Event::TagsGenerated { .. } => "tags_generated",
            Event::TagGenerationFailed { .. } => "tag_generation_failed",
        }
    }
}
