// src/lib.rs
// Public library surface for integration tests (and the binary).

pub mod digest;
pub mod extract;
pub mod notify;
pub mod rank;
pub mod scan;

// ---- Re-exports for stable public API ----
pub use crate::extract::client::{ChatModel, DynChatModel, XaiClient};
pub use crate::extract::Extractor;
pub use crate::notify::{DynNotifier, Notifier};
pub use crate::scan::config::ScanConfig;
pub use crate::scan::types::{GrantRecord, ScanSummary, Source};
pub use crate::scan::Scanner;
