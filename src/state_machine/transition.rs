//! Pure state transition function
//!
//! Every selection cascade, busy-flag check and message update goes through
//! here. The function performs no I/O: tree mutations, timers and assistant
//! calls are returned as effects for the runtime to execute.

use super::state::{Message, SelectionState};
use super::{Effect, Event, SessionState};
use crate::content::{ContentTree, NodePath};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Busy: {0} already in progress")]
    Busy(&'static str),
    #[error("Input is empty")]
    EmptyInput,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per event
pub fn transition(
    state: &SessionState,
    tree: &ContentTree,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Selection hierarchy
        // ============================================================
        Event::SelectStage { stage_id } => {
            if let Some(id) = &stage_id {
                if tree.stage(id).is_none() {
                    return Err(TransitionError::InvalidSelection(format!(
                        "unknown stage {id}"
                    )));
                }
            }
            let selection = cascade(&state.selection, Level::Stage(stage_id));
            Ok(with_selection(state, selection).with_effect(Effect::NotifySelection))
        }

        Event::SelectStep { step_id } => {
            let stage = state
                .selection
                .current_stage(tree)
                .ok_or_else(|| TransitionError::InvalidSelection("no stage selected".into()))?;
            if stage.step(&step_id).is_none() {
                return Err(TransitionError::InvalidSelection(format!(
                    "step {step_id} is not in stage {}",
                    stage.id
                )));
            }
            let selection = cascade(&state.selection, Level::Step(step_id));
            Ok(with_selection(state, selection).with_effect(Effect::NotifySelection))
        }

        Event::SelectNode { node_id } => {
            let step = state
                .selection
                .current_step(tree)
                .ok_or_else(|| TransitionError::InvalidSelection("no step selected".into()))?;
            if step.node(&node_id).is_none() {
                return Err(TransitionError::InvalidSelection(format!(
                    "node {node_id} is not in step {}",
                    step.id
                )));
            }
            let selection = cascade(&state.selection, Level::Node(Some(node_id)));
            Ok(with_selection(state, selection).with_effect(Effect::NotifySelection))
        }

        Event::DeselectNode => {
            let selection = cascade(&state.selection, Level::Node(None));
            Ok(with_selection(state, selection).with_effect(Effect::NotifySelection))
        }

        // ============================================================
        // Tag editing
        // ============================================================
        Event::ToggleTagEdit { tag_id } => {
            let mut selection = state.selection.clone();
            if selection.editing_tag_id.as_deref() == Some(tag_id.as_str()) {
                selection.editing_tag_id = None;
            } else {
                let node = state
                    .selection
                    .current_node(tree)
                    .ok_or_else(|| TransitionError::NotFound("no node selected".into()))?;
                if node.tag(&tag_id).is_none() {
                    return Err(TransitionError::NotFound(format!(
                        "tag {tag_id} on node {}",
                        node.id
                    )));
                }
                selection.editing_tag_id = Some(tag_id);
            }
            Ok(with_selection(state, selection).with_effect(Effect::NotifySelection))
        }

        Event::CommitTagEdit {
            tag_id,
            description,
        } => {
            let (path, node) = state
                .selection
                .node_path()
                .and_then(|path| tree.node_at(&path).map(|node| (path, node)))
                .ok_or_else(|| TransitionError::NotFound("no node selected".into()))?;
            if node.tag(&tag_id).is_none() {
                return Err(TransitionError::NotFound(format!(
                    "tag {tag_id} on node {}",
                    node.id
                )));
            }

            let mut selection = state.selection.clone();
            if selection.editing_tag_id.as_deref() == Some(tag_id.as_str()) {
                selection.editing_tag_id = None;
            }
            Ok(with_selection(state, selection).with_effects([
                Effect::UpdateTagDescription {
                    path: path.clone(),
                    tag_id,
                    description,
                },
                Effect::NotifyTags { path },
                Effect::NotifySelection,
            ]))
        }

        // ============================================================
        // Conversation
        // ============================================================
        Event::QueryInput { text } => {
            let mut new_state = state.clone();
            new_state.conversation.current_query = text;
            Ok(TransitionResult::new(new_state).with_effect(Effect::NotifyConversation))
        }

        Event::SubmitQuery {
            message_id,
            text,
            sent_at,
        } => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            if state.conversation.is_streaming {
                return Err(TransitionError::Busy("response"));
            }

            let message = Message::user(message_id.clone(), text.clone(), sent_at);
            let mut new_state = state.clone();
            new_state.conversation.messages.push(message.clone());
            new_state.conversation.current_query.clear();
            new_state.conversation.is_streaming = true;
            new_state.conversation.pending_request = Some(message_id.clone());

            Ok(TransitionResult::new(new_state).with_effects([
                Effect::notify_message(&message),
                Effect::NotifyConversation,
                Effect::RequestResponse {
                    request_id: message_id,
                    query: text,
                },
            ]))
        }

        Event::ResponseReady {
            request_id,
            message_id,
            text,
            started_at,
        } => {
            expect_pending_request(state, &request_id)?;
            if let Some(existing) = state.conversation.streaming_message() {
                return Err(TransitionError::InvalidTransition(format!(
                    "message {} is already streaming",
                    existing.id
                )));
            }

            let message = Message::assistant_placeholder(message_id.clone(), started_at);
            let mut new_state = state.clone();
            new_state.conversation.messages.push(message.clone());
            new_state.conversation.pending_request = None;

            Ok(TransitionResult::new(new_state).with_effects([
                Effect::notify_message(&message),
                Effect::StartReveal { message_id, text },
            ]))
        }

        Event::ResponseFailed {
            request_id,
            message,
        } => {
            expect_pending_request(state, &request_id)?;
            let mut new_state = state.clone();
            new_state.conversation.is_streaming = false;
            new_state.conversation.pending_request = None;
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::NotifyConversation,
                Effect::notify_error(message),
            ]))
        }

        Event::RevealChunk { message_id, chunk } => {
            let mut new_state = state.clone();
            let message = streaming_message_mut(&mut new_state, &message_id)?;
            message.content.push(chunk);
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::NotifyDelta { message_id, chunk }))
        }

        Event::RevealComplete { message_id } => {
            let mut new_state = state.clone();
            let message = streaming_message_mut(&mut new_state, &message_id)?;
            message.streaming = false;
            let finished = message.clone();
            new_state.conversation.is_streaming = false;

            Ok(TransitionResult::new(new_state).with_effects([
                Effect::notify_message(&finished),
                Effect::NotifyConversation,
            ]))
        }

        Event::CancelReveal => {
            if !state.conversation.is_streaming {
                return Err(TransitionError::InvalidTransition(
                    "no response in flight".into(),
                ));
            }

            // Whatever has been revealed so far stays, truncated
            let mut new_state = state.clone();
            let truncated = new_state
                .conversation
                .messages
                .iter_mut()
                .find(|m| m.streaming)
                .map(|m| {
                    m.streaming = false;
                    m.clone()
                });
            new_state.conversation.is_streaming = false;
            new_state.conversation.pending_request = None;

            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::AbortReveal)
                .with_effects(truncated.as_ref().map(Effect::notify_message))
                .with_effect(Effect::NotifyConversation))
        }

        // ============================================================
        // Tag generation
        // ============================================================
        Event::SubmitPrompt { node_id, prompt } => {
            if prompt.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            if state.conversation.is_generating_tags {
                return Err(TransitionError::Busy("tag generation"));
            }
            let path = node_in_current_step(&state.selection, tree, &node_id)?;

            let mut new_state = state.clone();
            new_state.conversation.is_generating_tags = true;
            new_state.conversation.tag_target = Some(path.clone());

            Ok(TransitionResult::new(new_state).with_effects([
                Effect::NotifyConversation,
                Effect::GenerateTags { path, prompt },
            ]))
        }

        Event::TagsGenerated { path, tags } => {
            if !state.conversation.is_generating_tags
                || state.conversation.tag_target.as_ref() != Some(&path)
            {
                return Err(TransitionError::InvalidTransition(format!(
                    "no tag generation in flight for node {}",
                    path.node_id
                )));
            }
            let mut new_state = state.clone();
            clear_tag_generation(&mut new_state);

            Ok(TransitionResult::new(new_state).with_effects([
                Effect::AppendTags {
                    path: path.clone(),
                    tags,
                },
                Effect::NotifyTags { path },
                Effect::NotifyConversation,
            ]))
        }

        Event::TagGenerationFailed { message } => {
            if !state.conversation.is_generating_tags {
                return Err(TransitionError::InvalidTransition(
                    "tag generation failed with none in flight".into(),
                ));
            }
            let mut new_state = state.clone();
            clear_tag_generation(&mut new_state);
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::NotifyConversation,
                Effect::notify_error(message),
            ]))
        }

        Event::CancelTagGeneration { node_id } => {
            if !state.conversation.is_generating_tags {
                return Err(TransitionError::InvalidTransition(
                    "no tag generation in flight".into(),
                ));
            }
            if state
                .conversation
                .tag_target
                .as_ref()
                .is_some_and(|target| target.node_id != node_id)
            {
                return Err(TransitionError::NotFound(format!(
                    "no tag generation in flight for node {node_id}"
                )));
            }
            let mut new_state = state.clone();
            clear_tag_generation(&mut new_state);
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::AbortTagGeneration,
                Effect::NotifyConversation,
            ]))
        }
    }
}

/// Level being set by a selection event
enum Level {
    Stage(Option<String>),
    Step(String),
    Node(Option<String>),
}

/// Set one level and reset everything below it. This is the only place
/// selection cursors are written.
fn cascade(current: &SelectionState, level: Level) -> SelectionState {
    match level {
        Level::Stage(stage_id) => SelectionState {
            selected_stage_id: stage_id,
            ..SelectionState::default()
        },
        Level::Step(step_id) => SelectionState {
            selected_stage_id: current.selected_stage_id.clone(),
            selected_step_id: Some(step_id),
            ..SelectionState::default()
        },
        Level::Node(node_id) => {
            // Editing belongs to the open node; it ends when the node changes
            let editing_tag_id = if node_id == current.selected_node_id {
                current.editing_tag_id.clone()
            } else {
                None
            };
            SelectionState {
                selected_stage_id: current.selected_stage_id.clone(),
                selected_step_id: current.selected_step_id.clone(),
                selected_node_id: node_id,
                editing_tag_id,
            }
        }
    }
}

fn with_selection(state: &SessionState, selection: SelectionState) -> TransitionResult {
    TransitionResult::new(SessionState {
        selection,
        conversation: state.conversation.clone(),
    })
}

fn streaming_message_mut<'a>(
    state: &'a mut SessionState,
    message_id: &str,
) -> Result<&'a mut Message, TransitionError> {
    match state.conversation.message_mut(message_id) {
        Some(message) if message.streaming => Ok(message),
        Some(_) => Err(TransitionError::InvalidTransition(format!(
            "message {message_id} is not streaming"
        ))),
        None => Err(TransitionError::InvalidTransition(format!(
            "unknown message {message_id}"
        ))),
    }
}

fn node_in_current_step(
    selection: &SelectionState,
    tree: &ContentTree,
    node_id: &str,
) -> Result<NodePath, TransitionError> {
    let (stage, step) = selection
        .current_stage(tree)
        .zip(selection.current_step(tree))
        .ok_or_else(|| TransitionError::NotFound(format!("node {node_id}: no step selected")))?;
    if step.node(node_id).is_none() {
        return Err(TransitionError::NotFound(format!(
            "node {node_id} in step {}",
            step.id
        )));
    }
    Ok(NodePath::new(stage.id.clone(), step.id.clone(), node_id))
}

/// Replies are only accepted for the query currently awaiting one
fn expect_pending_request(state: &SessionState, request_id: &str) -> Result<(), TransitionError> {
    match state.conversation.pending_request.as_deref() {
        Some(pending) if pending == request_id => Ok(()),
        Some(pending) => Err(TransitionError::InvalidTransition(format!(
            "reply for {request_id} arrived while awaiting {pending}"
        ))),
        None => Err(TransitionError::InvalidTransition(format!(
            "reply for {request_id} arrived with no query awaiting one"
        ))),
    }
}

fn clear_tag_generation(state: &mut SessionState) {
    state.conversation.is_generating_tags = false;
    state.conversation.tag_target = None;
}
