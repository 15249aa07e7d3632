//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::content::{default_tree, ContentTree};
use chrono::Utc;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const REPLY: &str = "Enterprise security is the top factor.\n\n1. API depth matters.";

/// Every id in the default tree plus a few that do not exist anywhere
fn stage_ids() -> Vec<&'static str> {
    vec!["input-processing", "enrichment", "missing-stage"]
}

fn step_ids() -> Vec<&'static str> {
    vec![
        "data-collection",
        "data-validation",
        "metadata-enrichment",
        "missing-step",
    ]
}

fn node_ids() -> Vec<&'static str> {
    vec!["g2-api", "validator", "metadata", "missing-node"]
}

fn tag_ids() -> Vec<&'static str> {
    vec!["api-1", "input-1", "validation-1", "metadata-1", "missing-tag"]
}

/// Apply an event, keeping the old state when it is rejected
fn step(state: SessionState, tree: &ContentTree, event: Event) -> SessionState {
    match transition(&state, tree, event) {
        Ok(result) => result.new_state,
        Err(_) => state,
    }
}

/// Check the prefix-chain invariant against the tree
fn selection_is_consistent(selection: &SelectionState, tree: &ContentTree) -> bool {
    let stage_ok = selection
        .selected_stage_id
        .as_deref()
        .map_or(true, |id| tree.stage(id).is_some());
    let step_ok = match &selection.selected_step_id {
        None => true,
        Some(_) => selection.current_step(tree).is_some(),
    };
    let node_ok = match &selection.selected_node_id {
        None => true,
        Some(_) => selection.current_node(tree).is_some(),
    };
    let editing_ok = match &selection.editing_tag_id {
        None => true,
        Some(tag_id) => selection
            .current_node(tree)
            .is_some_and(|node| node.tag(tag_id).is_some()),
    };
    stage_ok && step_ok && node_ok && editing_ok
}

fn pending_request(state: &SessionState) -> String {
    state.conversation.pending_request.clone().unwrap_or_default()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_selection_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        prop::sample::select(stage_ids()).prop_map(|id| Event::SelectStage {
            stage_id: Some(id.to_string())
        }),
        Just(Event::SelectStage { stage_id: None }),
        prop::sample::select(step_ids()).prop_map(|id| Event::SelectStep {
            step_id: id.to_string()
        }),
        prop::sample::select(node_ids()).prop_map(|id| Event::SelectNode {
            node_id: id.to_string()
        }),
        Just(Event::DeselectNode),
        prop::sample::select(tag_ids()).prop_map(|id| Event::ToggleTagEdit {
            tag_id: id.to_string()
        }),
    ]
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,6}"
}

fn arb_query() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z ?]{0,30}"
}

fn submit(text: String) -> Event {
    Event::SubmitQuery {
        message_id: uuid::Uuid::new_v4().to_string(),
        text,
        sent_at: Utc::now(),
    }
}

// ============================================================================
// Selection properties
// ============================================================================

proptest! {
    #[test]
    fn prop_selection_always_consistent(
        events in proptest::collection::vec(arb_selection_event(), 0..40)
    ) {
        let tree = default_tree();
        let mut state = SessionState::new(Some("input-processing".into()));
        for event in events {
            state = step(state, &tree, event);
            prop_assert!(selection_is_consistent(&state.selection, &tree));
        }
    }

    #[test]
    fn prop_select_stage_clears_descendants(
        prefix in proptest::collection::vec(arb_selection_event(), 0..20),
        stage in prop::sample::select(stage_ids()),
    ) {
        let tree = default_tree();
        let mut state = SessionState::new(Some("input-processing".into()));
        for event in prefix {
            state = step(state, &tree, event);
        }

        if let Ok(result) = transition(&state, &tree, Event::SelectStage { stage_id: Some(stage.to_string()) }) {
            prop_assert!(result.new_state.selection.selected_step_id.is_none());
            prop_assert!(result.new_state.selection.selected_node_id.is_none());
            prop_assert!(result.new_state.selection.editing_tag_id.is_none());
        } else {
            prop_assert!(tree.stage(stage).is_none());
        }
    }

    #[test]
    fn prop_select_step_clears_node_and_belongs_to_stage(
        prefix in proptest::collection::vec(arb_selection_event(), 0..20),
        step_id in prop::sample::select(step_ids()),
    ) {
        let tree = default_tree();
        let mut state = SessionState::new(Some("input-processing".into()));
        for event in prefix {
            state = step(state, &tree, event);
        }

        match transition(&state, &tree, Event::SelectStep { step_id: step_id.to_string() }) {
            Ok(result) => {
                let sel = &result.new_state.selection;
                prop_assert!(sel.selected_node_id.is_none());
                prop_assert_eq!(sel.selected_stage_id.clone(), state.selection.selected_stage_id.clone());
                let stage = sel.current_stage(&tree).unwrap();
                prop_assert!(stage.step(step_id).is_some());
            }
            Err(e) => {
                prop_assert!(matches!(e, TransitionError::InvalidSelection(_)));
                let belongs = state
                    .selection
                    .current_stage(&tree)
                    .is_some_and(|s| s.step(step_id).is_some());
                prop_assert!(!belongs);
            }
        }
    }

    #[test]
    fn prop_rejected_selection_changes_nothing(
        prefix in proptest::collection::vec(arb_selection_event(), 0..20),
        event in arb_selection_event(),
    ) {
        let tree = default_tree();
        let mut state = SessionState::new(Some("input-processing".into()));
        for e in prefix {
            state = step(state, &tree, e);
        }
        let before = state.clone();
        if transition(&state, &tree, event).is_err() {
            prop_assert_eq!(state, before);
        }
    }
}

// ============================================================================
// Conversation properties
// ============================================================================

proptest! {
    #[test]
    fn prop_blank_query_leaves_conversation_unchanged(text in arb_blank()) {
        let tree = default_tree();
        let state = SessionState::default();
        let result = transition(&state, &tree, submit(text));
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyInput);
    }

    #[test]
    fn prop_query_while_streaming_is_rejected(first in arb_query(), second in arb_query()) {
        let tree = default_tree();
        let state = step(SessionState::default(), &tree, submit(first));
        prop_assert!(state.conversation.is_streaming);

        let err = transition(&state, &tree, submit(second)).unwrap_err();
        prop_assert_eq!(err, TransitionError::Busy("response"));
        prop_assert_eq!(state.conversation.messages.len(), 1);
    }

    #[test]
    fn prop_reveal_is_monotonic_prefix(
        query in arb_query(),
        cancel_after in proptest::option::of(0usize..REPLY.len()),
    ) {
        let tree = default_tree();
        let state = step(SessionState::default(), &tree, submit(query.clone()));
        let request_id = pending_request(&state);
        let mut state = step(state, &tree, Event::ResponseReady {
            request_id,
            message_id: "reply".into(),
            text: REPLY.into(),
            started_at: Utc::now(),
        });

        let mut last_len = 0;
        for (i, chunk) in REPLY.chars().enumerate() {
            if cancel_after == Some(i) {
                state = step(state, &tree, Event::CancelReveal);
            }
            state = step(state, &tree, Event::RevealChunk { message_id: "reply".into(), chunk });
            let content = &state.conversation.messages[1].content;
            prop_assert!(REPLY.starts_with(content.as_str()));
            prop_assert!(content.len() >= last_len);
            last_len = content.len();
        }
        state = step(state, &tree, Event::RevealComplete { message_id: "reply".into() });

        let conv = &state.conversation;
        prop_assert!(!conv.is_streaming);
        prop_assert_eq!(conv.messages.len(), 2);
        prop_assert_eq!(&conv.messages[0].content, &query);
        prop_assert_eq!(conv.messages[0].role, Role::User);
        prop_assert_eq!(conv.messages[1].role, Role::Assistant);
        prop_assert!(!conv.messages[1].streaming);
        prop_assert!(conv.messages.iter().filter(|m| m.streaming).count() == 0);
        if cancel_after.is_none() {
            prop_assert_eq!(conv.messages[1].content.as_str(), REPLY);
        }
    }

    #[test]
    fn prop_at_most_one_streaming_message(
        queries in proptest::collection::vec(arb_query(), 1..5)
    ) {
        let tree = default_tree();
        let mut state = SessionState::default();
        for (i, query) in queries.into_iter().enumerate() {
            let reply_id = format!("reply-{i}");
            state = step(state, &tree, submit(query));
            let request_id = pending_request(&state);
            state = step(state, &tree, Event::ResponseReady {
                request_id: request_id.clone(),
                message_id: reply_id.clone(),
                text: "ok".into(),
                started_at: Utc::now(),
            });
            // Second ready for the same query must not open another message
            state = step(state, &tree, Event::ResponseReady {
                request_id,
                message_id: format!("{reply_id}-dup"),
                text: "ok".into(),
                started_at: Utc::now(),
            });
            prop_assert!(state.conversation.messages.iter().filter(|m| m.streaming).count() <= 1);
            for chunk in "ok".chars() {
                state = step(state, &tree, Event::RevealChunk { message_id: reply_id.clone(), chunk });
            }
            state = step(state, &tree, Event::RevealComplete { message_id: reply_id });
            prop_assert!(!state.conversation.is_streaming);
        }
    }
}

// ============================================================================
// Tag properties
// ============================================================================

proptest! {
    #[test]
    fn prop_commit_unknown_tag_leaves_descriptions(
        tag_id in "[a-z]{3,10}",
        description in "[a-zA-Z ]{0,20}",
    ) {
        let tree = default_tree();
        let state = SessionState::new(Some("input-processing".into()));
        let state = step(state, &tree, Event::SelectStep { step_id: "data-collection".into() });
        let state = step(state, &tree, Event::SelectNode { node_id: "g2-api".into() });
        prop_assume!(tag_ids().iter().all(|known| *known != tag_id));

        let err = transition(&state, &tree, Event::CommitTagEdit { tag_id, description }).unwrap_err();
        prop_assert!(matches!(err, TransitionError::NotFound(_)));
    }

    #[test]
    fn prop_double_toggle_closes_edit(tag in prop::sample::select(vec!["api-1", "input-1"])) {
        let tree = default_tree();
        let state = SessionState::new(Some("input-processing".into()));
        let state = step(state, &tree, Event::SelectStep { step_id: "data-collection".into() });
        let state = step(state, &tree, Event::SelectNode { node_id: "g2-api".into() });

        let opened = transition(&state, &tree, Event::ToggleTagEdit { tag_id: tag.into() }).unwrap();
        prop_assert_eq!(opened.new_state.selection.editing_tag_id.as_deref(), Some(tag));
        let closed = transition(&opened.new_state, &tree, Event::ToggleTagEdit { tag_id: tag.into() }).unwrap();
        prop_assert!(closed.new_state.selection.editing_tag_id.is_none());
        let writes_description = closed
            .effects
            .iter()
            .any(|e| matches!(e, Effect::UpdateTagDescription { .. }));
        prop_assert!(!writes_description);
    }

    #[test]
    fn prop_prompt_guarded_by_busy_flag(prompts in proptest::collection::vec(arb_query(), 2..5)) {
        let tree = default_tree();
        let state = SessionState::new(Some("enrichment".into()));
        let mut state = step(state, &tree, Event::SelectStep { step_id: "metadata-enrichment".into() });

        let mut accepted = 0;
        for prompt in prompts {
            match transition(&state, &tree, Event::SubmitPrompt { node_id: "metadata".into(), prompt }) {
                Ok(result) => {
                    accepted += 1;
                    state = result.new_state;
                }
                Err(e) => {
                    prop_assert_eq!(e, TransitionError::Busy("tag generation"));
                }
            }
        }
        prop_assert_eq!(accepted, 1);
        prop_assert!(state.conversation.is_generating_tags);
    }
}
