//! Session runtime
//!
//! One actor task owns the content tree and session state. Handles send it
//! commands; it reduces them through the state machine, executes effects and
//! publishes the result.

mod executor;


pub use executor::SessionRuntime;

use crate::assistant::Assistant;
use crate::content::{ContentTree, Node, NodePath, Stage, Step, Tag};
use crate::state_machine::{
    ConversationState, Event, Message, SelectionState, SessionState, TransitionError,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Request sent to the session actor
#[derive(Debug)]
pub struct Command {
    pub event: Event,
    /// Absent for events produced by the runtime's own background tasks
    pub reply: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl Command {
    pub fn internal(event: Event) -> Self {
        Self { event, reply: None }
    }
}

/// Events sent to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Selection {
        selection: SelectionState,
    },
    Message {
        message: Message,
    },
    MessageDelta {
        message_id: String,
        chunk: char,
    },
    Conversation {
        current_query: String,
        is_streaming: bool,
        is_generating_tags: bool,
    },
    Tags {
        path: NodePath,
        tags: Vec<Tag>,
    },
    Error {
        message: String,
    },
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Selection { .. } => "selection",
            SessionEvent::Message { .. } => "message",
            SessionEvent::MessageDelta { .. } => "message_delta",
            SessionEvent::Conversation { .. } => "conversation",
            SessionEvent::Tags { .. } => "tags",
            SessionEvent::Error { .. } => "error",
        }
    }
}

/// Event tagged with the transition that produced it
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub sequence_id: u64,
    pub event: SessionEvent,
}

/// Point-in-time copy of everything the presentation layer renders
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Last transition reflected here. Updates with a higher id are newer.
    pub sequence_id: u64,
    pub tree: ContentTree,
    pub selection: SelectionState,
    pub conversation: ConversationState,
}

impl SessionSnapshot {
    pub fn new(sequence_id: u64, tree: &ContentTree, state: &SessionState) -> Self {
        Self {
            sequence_id,
            tree: tree.clone(),
            selection: state.selection.clone(),
            conversation: state.conversation.clone(),
        }
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.selection.current_stage(&self.tree)
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.selection.current_step(&self.tree)
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.selection.current_node(&self.tree)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session runtime is not running")]
    Closed,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Runtime settings
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Pause after each revealed character
    pub reveal_delay: Duration,
}

/// Controller handle for one session. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<Arc<SessionSnapshot>>,
    broadcast_tx: broadcast::Sender<SessionUpdate>,
}

/// Spawn the session actor on the current tokio runtime
pub fn start_session<A: Assistant + 'static>(
    tree: ContentTree,
    initial_stage: Option<String>,
    assistant: A,
    config: RuntimeConfig,
) -> SessionHandle {
    let state = SessionState::new(initial_stage);
    let (command_tx, command_rx) = mpsc::channel(256);
    let (broadcast_tx, _) = broadcast::channel(1024);
    let (snapshot_tx, snapshot_rx) =
        watch::channel(Arc::new(SessionSnapshot::new(0, &tree, &state)));

    let runtime = SessionRuntime::new(
        tree,
        state,
        assistant,
        config,
        command_rx,
        command_tx.downgrade(),
        broadcast_tx.clone(),
        snapshot_tx,
    );
    tokio::spawn(runtime.run());

    SessionHandle {
        command_tx,
        snapshot_rx,
        broadcast_tx,
    }
}

impl SessionHandle {
    /// Apply an event and wait for the transition (not for any background
    /// work it starts)
    pub async fn dispatch(&self, event: Event) -> SessionResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)??;
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Updates published after a snapshot carry a higher `sequence_id`
    /// than it, so subscribe first and then read the snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.broadcast_tx.subscribe()
    }

    pub async fn select_stage(&self, stage_id: Option<String>) -> SessionResult<()> {
        self.dispatch(Event::SelectStage { stage_id }).await
    }

    pub async fn select_step(&self, step_id: impl Into<String>) -> SessionResult<()> {
        self.dispatch(Event::SelectStep {
            step_id: step_id.into(),
        })
        .await
    }

    pub async fn select_node(&self, node_id: impl Into<String>) -> SessionResult<()> {
        self.dispatch(Event::SelectNode {
            node_id: node_id.into(),
        })
        .await
    }

    pub async fn deselect_node(&self) -> SessionResult<()> {
        self.dispatch(Event::DeselectNode).await
    }

    /// Edit-button press for a tag (toggles edit mode)
    pub async fn begin_edit_tag(&self, tag_id: impl Into<String>) -> SessionResult<()> {
        self.dispatch(Event::ToggleTagEdit {
            tag_id: tag_id.into(),
        })
        .await
    }

    pub async fn commit_tag_edit(
        &self,
        tag_id: impl Into<String>,
        description: impl Into<String>,
    ) -> SessionResult<()> {
        self.dispatch(Event::CommitTagEdit {
            tag_id: tag_id.into(),
            description: description.into(),
        })
        .await
    }

    pub async fn set_query_input(&self, text: impl Into<String>) -> SessionResult<()> {
        self.dispatch(Event::QueryInput { text: text.into() }).await
    }

    /// Submit a report query. Returns once the user message is recorded;
    /// the reply streams in afterwards.
    pub async fn submit_query(&self, text: impl Into<String>) -> SessionResult<()> {
        self.dispatch(Event::SubmitQuery {
            message_id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sent_at: Utc::now(),
        })
        .await
    }

    pub async fn cancel_reveal(&self) -> SessionResult<()> {
        self.dispatch(Event::CancelReveal).await
    }

    pub async fn submit_prompt(
        &self,
        prompt: impl Into<String>,
        node_id: impl Into<String>,
    ) -> SessionResult<()> {
        self.dispatch(Event::SubmitPrompt {
            node_id: node_id.into(),
            prompt: prompt.into(),
        })
        .await
    }

    pub async fn cancel_tag_generation(&self, node_id: impl Into<String>) -> SessionResult<()> {
        self.dispatch(Event::CancelTagGeneration {
            node_id: node_id.into(),
        })
        .await
    }
}
