//! Error types shared by the grid engine, the plot store and sessions.

mod types;

pub use types::{GridError, Result};
