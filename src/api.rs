//! HTTP API for the review dashboard

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::report::Report;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub report: Arc<Report>,
}

impl AppState {
    pub fn new(session: SessionHandle, report: Report) -> Self {
        Self {
            session,
            report: Arc::new(report),
        }
    }
}
