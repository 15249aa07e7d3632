//! Effects produced by state transitions

use super::state::Message;
use crate::content::{NodePath, Tag};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the assistant for a reply to the query (spawns as background task)
    RequestResponse { request_id: String, query: String },

    /// Reveal `text` into the message one character at a time
    StartReveal { message_id: String, text: String },

    /// Abort the in-flight request or reveal
    AbortReveal,

    /// Ask the assistant for tags for a node (spawns as background task)
    GenerateTags { path: NodePath, prompt: String },

    /// Abort the in-flight tag generation
    AbortTagGeneration,

    /// Write a tag description into the content tree
    UpdateTagDescription {
        path: NodePath,
        tag_id: String,
        description: String,
    },

    /// Append tags to a node in the content tree
    AppendTags { path: NodePath, tags: Vec<Tag> },

    /// Notify clients that the selection changed
    NotifySelection,

    /// Notify clients of a new or finished message
    NotifyMessage { message: Message },

    /// Notify clients of one revealed character
    NotifyDelta { message_id: String, chunk: char },

    /// Notify clients that busy flags or the input buffer changed
    NotifyConversation,

    /// Notify clients that a node's tags changed
    NotifyTags { path: NodePath },

    /// Surface an error to clients
    NotifyError { message: String },
}

impl Effect {
    pub fn notify_message(message: &Message) -> Self {
        Effect::NotifyMessage {
            message: message.clone(),
        }
    }

    pub fn notify_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            message: message.into(),
        }
    }
}
