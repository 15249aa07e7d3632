//! Session state types

use crate::content::{ContentTree, Node, NodePath, Stage, Step};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Selection
// ============================================================================

/// Focus path into the content tree. Each cursor is only set when its parent
/// is set, and always names a child of the parent's collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected_stage_id: Option<String>,
    pub selected_step_id: Option<String>,
    pub selected_node_id: Option<String>,
    pub editing_tag_id: Option<String>,
}

impl SelectionState {
    /// Initial selection with an optional stage focused
    pub fn with_stage(stage_id: Option<String>) -> Self {
        Self {
            selected_stage_id: stage_id,
            ..Self::default()
        }
    }

    // Derived views are looked up on every call so that a cursor whose
    // target has disappeared reads as not found.

    pub fn current_stage<'a>(&self, tree: &'a ContentTree) -> Option<&'a Stage> {
        tree.stage(self.selected_stage_id.as_deref()?)
    }

    pub fn current_step<'a>(&self, tree: &'a ContentTree) -> Option<&'a Step> {
        self.current_stage(tree)?
            .step(self.selected_step_id.as_deref()?)
    }

    pub fn current_node<'a>(&self, tree: &'a ContentTree) -> Option<&'a Node> {
        self.current_step(tree)?
            .node(self.selected_node_id.as_deref()?)
    }

    /// Path of the selected node, if the full chain is set
    pub fn node_path(&self) -> Option<NodePath> {
        Some(NodePath::new(
            self.selected_stage_id.clone()?,
            self.selected_step_id.clone()?,
            self.selected_node_id.clone()?,
        ))
    }
}

// ============================================================================
// Conversation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub streaming: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(id: impl Into<String>, content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            role: Role::User,
            streaming: false,
            created_at: at,
        }
    }

    /// Empty assistant message that is about to be revealed
    pub fn assistant_placeholder(id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            role: Role::Assistant,
            streaming: true,
            created_at: at,
        }
    }
}

/// Message log plus the two busy flags guarding the simulated operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    /// Pending input buffer, cleared on submit
    pub current_query: String,
    pub is_streaming: bool,
    pub is_generating_tags: bool,
    /// Query whose reply has been requested but not yet started revealing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_request: Option<String>,
    /// Node that will receive the tags currently being generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_target: Option<NodePath>,
}

impl ConversationState {
    /// Check if either simulated operation is in flight
    pub fn is_working(&self) -> bool {
        self.is_streaming || self.is_generating_tags
    }

    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.streaming)
    }

    pub(crate) fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub selection: SelectionState,
    pub conversation: ConversationState,
}

impl SessionState {
    pub fn new(initial_stage: Option<String>) -> Self {
        Self {
            selection: SelectionState::with_stage(initial_stage),
            conversation: ConversationState::default(),
        }
    }
}
