// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod checkpoint;
pub mod config;
pub mod fetch;
pub mod history;
pub mod parse;
pub mod report;
pub mod sources;

// Delivery & orchestration
pub mod notify;
pub mod runner;

// ---- Re-exports for stable public API ----
pub use crate::config::{AccountConfig, Settings};
pub use crate::notify::{MastodonNotifier, Notifier, StdoutNotifier};
pub use crate::runner::{check_source, deliver, Outcome};
pub use crate::sources::{lookup, SourceConfig, UnknownSource};
