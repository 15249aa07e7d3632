//! Session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! selection cascades, tag editing, the simulated reply and tag generation
//! all reduce through [`transition`].

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ConversationState, Message, Role, SelectionState, SessionState};
pub use transition::{transition, TransitionError};
