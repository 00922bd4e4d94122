//! Selection engine orchestrator.
//!
//! Every operation is a pure function from one grid snapshot to the next;
//! sessions and checkout code build on top of these.

mod core;

pub use core::{
    Rebased, SelectionSummary, clear, deselect, finalize, mark_unavailable, rebase, summarize,
    toggle, toggle_at,
};
