//! API request and response types

use crate::content::{ContentTree, Node, Stage, Step};
use crate::report::{Highlights, Report};
use crate::runtime::SessionSnapshot;
use crate::state_machine::{ConversationState, SelectionState};
use serde::{Deserialize, Serialize};

/// Request to focus a stage (`null` clears the selection)
#[derive(Debug, Deserialize)]
pub struct SelectStageRequest {
    #[serde(default)]
    pub stage_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectStepRequest {
    pub step_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectNodeRequest {
    pub node_id: String,
}

/// Request to save a tag description
#[derive(Debug, Deserialize)]
pub struct CommitTagRequest {
    pub description: String,
}

/// Query text, for both the input buffer and submission
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
}

/// Request to generate tags for a node
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Response with the content tree
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub stages: ContentTree,
}

/// Session snapshot with the selection resolved against the tree
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub sequence_id: u64,
    pub selection: SelectionState,
    pub conversation: ConversationState,
    pub current_stage: Option<Stage>,
    pub current_step: Option<Step>,
    pub current_node: Option<Node>,
    pub working: bool,
}

impl From<&SessionSnapshot> for SessionResponse {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            sequence_id: snapshot.sequence_id,
            working: snapshot.conversation.is_working(),
            selection: snapshot.selection.clone(),
            conversation: snapshot.conversation.clone(),
            current_stage: snapshot.current_stage().cloned(),
            current_step: snapshot.current_step().cloned(),
            current_node: snapshot.current_node().cloned(),
        }
    }
}

/// Response with the report and its headline cards
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: Report,
    pub highlights: Highlights,
}

/// Response for accepted actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
