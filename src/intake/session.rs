//! Per-user intake sessions.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::intake::flow::{IntakeFlow, StepOutcome, into_tracked_item};
use crate::intake::IntakeListener;

/// Stable identity of a conversation partner.
pub type SessionKey = i64;

/// Active intake flows keyed by user. At most one flow per user.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionKey, IntakeFlow>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flow for `user`, replacing any flow in progress.
    /// Returns the first question.
    pub async fn start(&self, user: SessionKey, mut flow: IntakeFlow) -> Option<String> {
        let prompt = flow.prompt();
        let mut sessions = self.sessions.lock().await;
        if sessions.insert(user, flow).is_some() {
            log::info!("Intake restarted for user {user}");
        }
        prompt
    }

    pub async fn is_active(&self, user: SessionKey) -> bool {
        self.sessions.lock().await.contains_key(&user)
    }

    /// Drop the user's flow. Returns whether one was active.
    pub async fn cancel(&self, user: SessionKey) -> bool {
        match self.sessions.lock().await.remove(&user) {
            Some(mut flow) => {
                flow.cancel();
                true
            }
            None => false,
        }
    }

    /// Feed `input` to the user's flow and return the reply.
    ///
    /// Returns `None` when the user has no active flow. A completed flow is
    /// promoted to a tracked item and handed to `listener`.
    pub async fn handle(
        &self,
        user: SessionKey,
        input: &str,
        listener: &dyn IntakeListener,
    ) -> Option<String> {
        let outcome = {
            let mut sessions = self.sessions.lock().await;
            let flow = sessions.get_mut(&user)?;
            let outcome = flow.handle_input(input);
            if !flow.is_active() {
                sessions.remove(&user);
            }
            outcome
        };

        Some(match outcome {
            StepOutcome::Next(prompt) | StepOutcome::Retry(prompt) => prompt,
            StepOutcome::Cancelled => "Cancelled.".to_string(),
            StepOutcome::Closed => "Nothing to continue.".to_string(),
            StepOutcome::Complete(payload) => {
                let added = match into_tracked_item(payload) {
                    Ok(item) => {
                        let name = item.name.clone();
                        listener.item_added(item).await.map(|id| (name, id))
                    }
                    Err(e) => Err(e),
                };
                match added {
                    Ok((name, id)) => format!("Added {name} ({id})."),
                    Err(e) => {
                        log::error!("Intake for user {user} failed: {e}");
                        format!("Could not add the item: {e}")
                    }
                }
            }
        })
    }
}
