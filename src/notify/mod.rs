// src/notify/mod.rs
pub mod slack;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Delivery sink for the rendered digest. Send failures are reported to the
/// caller and logged, never fatal to the scan cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub type DynNotifier = Arc<dyn Notifier>;
