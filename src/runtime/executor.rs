//! Session runtime executor

use super::{Command, RuntimeConfig, SessionEvent, SessionSnapshot, SessionUpdate};

use crate::assistant::Assistant;
use crate::content::{ContentTree, NodePath};
use crate::state_machine::{transition, Effect, Event, SessionState, TransitionError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Actor owning the content tree and session state
pub struct SessionRuntime<A: Assistant + 'static> {
    tree: ContentTree,
    state: SessionState,
    assistant: Arc<A>,
    config: RuntimeConfig,
    command_rx: mpsc::Receiver<Command>,
    /// Weak so the loop ends once every handle is dropped
    command_tx: mpsc::WeakSender<Command>,
    broadcast_tx: broadcast::Sender<SessionUpdate>,
    snapshot_tx: watch::Sender<Arc<SessionSnapshot>>,
    /// Id of the last applied transition
    sequence_id: u64,
    /// Notifications from the transition being applied
    outbox: Vec<SessionEvent>,
    /// Token to cancel the in-flight reply request or reveal
    reply_cancel_token: Option<CancellationToken>,
    /// Token to cancel the in-flight tag generation
    tags_cancel_token: Option<CancellationToken>,
}

impl<A: Assistant + 'static> SessionRuntime<A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tree: ContentTree,
        state: SessionState,
        assistant: A,
        config: RuntimeConfig,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::WeakSender<Command>,
        broadcast_tx: broadcast::Sender<SessionUpdate>,
        snapshot_tx: watch::Sender<Arc<SessionSnapshot>>,
    ) -> Self {
        Self {
            tree,
            state,
            assistant: Arc::new(assistant),
            config,
            command_rx,
            command_tx,
            broadcast_tx,
            snapshot_tx,
            sequence_id: 0,
            outbox: Vec::new(),
            reply_cancel_token: None,
            tags_cancel_token: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            assistant = %self.assistant.name(),
            stage = ?self.state.selection.selected_stage_id,
            "Starting session runtime"
        );

        while let Some(Command { event, reply }) = self.command_rx.recv().await {
            let result = self.process_event(event, reply.is_some());
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }

        // Nothing can observe background work any more
        Self::cancel(&mut self.reply_cancel_token);
        Self::cancel(&mut self.tags_cancel_token);
        tracing::info!("Session runtime stopped");
    }

    fn process_event(&mut self, event: Event, from_client: bool) -> Result<(), TransitionError> {
        let event_name = event.name();

        let result = match transition(&self.state, &self.tree, event) {
            Ok(result) => result,
            Err(e) => {
                if from_client {
                    tracing::info!(event = event_name, error = %e, "Event rejected");
                } else {
                    // Work finished after it was cancelled or superseded
                    tracing::debug!(event = event_name, error = %e, "Dropping stale event");
                }
                return Err(e);
            }
        };

        if event_name != "reveal_chunk" {
            tracing::debug!(event = event_name, effects = result.effects.len(), "Transition");
        }

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }

        if !self.state.conversation.is_streaming {
            self.reply_cancel_token = None;
        }
        if !self.state.conversation.is_generating_tags {
            self.tags_cancel_token = None;
        }

        // Snapshot first: anyone who can see an update can also see its state
        self.sequence_id += 1;
        self.snapshot_tx.send_replace(Arc::new(SessionSnapshot::new(
            self.sequence_id,
            &self.tree,
            &self.state,
        )));
        for event in std::mem::take(&mut self.outbox) {
            // No subscribers is fine
            let _ = self.broadcast_tx.send(SessionUpdate {
                sequence_id: self.sequence_id,
                event,
            });
        }
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestResponse { request_id, query } => {
                self.spawn_request(request_id, query);
            }

            Effect::StartReveal { message_id, text } => self.spawn_reveal(message_id, text),

            Effect::AbortReveal => {
                tracing::info!("Cancelling reply");
                Self::cancel(&mut self.reply_cancel_token);
            }

            Effect::GenerateTags { path, prompt } => self.spawn_tag_generation(path, prompt),

            Effect::AbortTagGeneration => {
                tracing::info!("Cancelling tag generation");
                Self::cancel(&mut self.tags_cancel_token);
            }

            Effect::UpdateTagDescription {
                path,
                tag_id,
                description,
            } => {
                if self.tree.set_tag_description(&path, &tag_id, &description) {
                    tracing::info!(node_id = %path.node_id, tag_id = %tag_id, "Tag description updated");
                } else {
                    tracing::warn!(node_id = %path.node_id, tag_id = %tag_id, "Tag to update not found");
                }
            }

            Effect::AppendTags { path, tags } => match self.tree.append_tags(&path, &tags) {
                Some(added) => {
                    tracing::info!(node_id = %path.node_id, added, "Tags appended");
                }
                None => {
                    tracing::warn!(node_id = %path.node_id, "Node for generated tags not found");
                }
            },

            Effect::NotifySelection => self.notify(SessionEvent::Selection {
                selection: self.state.selection.clone(),
            }),

            Effect::NotifyMessage { message } => self.notify(SessionEvent::Message { message }),

            Effect::NotifyDelta { message_id, chunk } => {
                self.notify(SessionEvent::MessageDelta { message_id, chunk });
            }

            Effect::NotifyConversation => {
                let conversation = &self.state.conversation;
                self.notify(SessionEvent::Conversation {
                    current_query: conversation.current_query.clone(),
                    is_streaming: conversation.is_streaming,
                    is_generating_tags: conversation.is_generating_tags,
                });
            }

            Effect::NotifyTags { path } => {
                let tags = self
                    .tree
                    .node_at(&path)
                    .map(|node| node.tags.clone())
                    .unwrap_or_default();
                self.notify(SessionEvent::Tags { path, tags });
            }

            Effect::NotifyError { message } => {
                tracing::warn!(error = %message, "Session error");
                self.notify(SessionEvent::Error { message });
            }
        }
    }

    fn notify(&mut self, event: SessionEvent) {
        self.outbox.push(event);
    }

    fn cancel(token: &mut Option<CancellationToken>) {
        if let Some(token) = token.take() {
            token.cancel();
        }
    }

    fn spawn_request(&mut self, request_id: String, query: String) {
        let Some(tx) = self.command_tx.upgrade() else {
            return;
        };
        let token = CancellationToken::new();
        self.reply_cancel_token = Some(token.clone());
        let assistant = self.assistant.clone();

        tokio::spawn(async move {
            let event = tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = assistant.respond(&query) => match result {
                    Ok(text) => Event::ResponseReady {
                        request_id,
                        message_id: uuid::Uuid::new_v4().to_string(),
                        text,
                        started_at: Utc::now(),
                    },
                    Err(e) => Event::ResponseFailed {
                        request_id,
                        message: e.to_string(),
                    },
                },
            };
            let _ = tx.send(Command::internal(event)).await;
        });
    }

    fn spawn_reveal(&mut self, message_id: String, text: String) {
        let Some(tx) = self.command_tx.upgrade() else {
            return;
        };
        let token = self
            .reply_cancel_token
            .get_or_insert_with(CancellationToken::new)
            .clone();
        let delay = self.config.reveal_delay;

        tokio::spawn(reveal(tx, token, delay, message_id, text));
    }

    fn spawn_tag_generation(&mut self, path: NodePath, prompt: String) {
        let Some(tx) = self.command_tx.upgrade() else {
            return;
        };
        let token = CancellationToken::new();
        self.tags_cancel_token = Some(token.clone());
        let assistant = self.assistant.clone();

        tokio::spawn(async move {
            let event = tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = assistant.generate_tags(&path, &prompt) => match result {
                    Ok(tags) => Event::TagsGenerated { path, tags },
                    Err(e) => Event::TagGenerationFailed {
                        message: e.to_string(),
                    },
                },
            };
            let _ = tx.send(Command::internal(event)).await;
        });
    }
}

/// Feed `text` back to the actor one character per `delay`
async fn reveal(
    tx: mpsc::Sender<Command>,
    token: CancellationToken,
    delay: Duration,
    message_id: String,
    text: String,
) {
    for chunk in text.chars() {
        if token.is_cancelled() {
            return;
        }
        let event = Event::RevealChunk {
            message_id: message_id.clone(),
            chunk,
        };
        if tx.send(Command::internal(event)).await.is_err() {
            return;
        }
        tokio::select! {
            biased;
            () = token.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }

    if !token.is_cancelled() {
        let _ = tx
            .send(Command::internal(Event::RevealComplete { message_id }))
            .await;
    }
}
