//! Conversational intake of new tracked items.

pub mod flow;
pub mod session;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::TrackedItem;

pub use flow::{FlowState, IntakeFlow, IntakeStep, StepOutcome};
pub use session::SessionStore;

/// Receives items collected by a completed intake flow.
#[async_trait]
pub trait IntakeListener: Send + Sync {
    /// Store the item and return its id.
    async fn item_added(&self, item: TrackedItem) -> Result<String>;
}
