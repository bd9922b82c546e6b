//! Bookmark state: an owned registry of per-target state and observers, plus
//! the HTTP calls that keep it in sync.

mod client;
mod store;

pub use client::{BookmarkClient, ToggleOutcome};
pub use store::{BookmarkKey, BookmarkState, BookmarkStore, ToggleFlag, ToggleObserver};
