//! Step-by-step collection of a new tracked item.
//!
//! A flow walks its steps in order. Input that fails a step's validator
//! keeps the flow on that step and re-prompts; valid input is stored under
//! the step's field and advances. `/cancel` ends the flow from any step.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::TrackedItem;

/// Text that cancels a flow at any step.
pub const CANCEL_COMMAND: &str = "/cancel";

/// Checks one raw input, returning a user-facing message on failure.
pub type Validator = Arc<dyn Fn(&str) -> std::result::Result<(), String> + Send + Sync>;

/// Collected field values.
pub type Payload = BTreeMap<String, String>;

/// One question of a flow.
#[derive(Clone)]
pub struct IntakeStep {
    pub field: String,
    pub prompt: String,
    pub validator: Option<Validator>,
}

impl IntakeStep {
    pub fn new(field: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prompt: prompt.into(),
            validator: None,
        }
    }

    pub fn validated(
        mut self,
        validator: impl Fn(&str) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl fmt::Debug for IntakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntakeStep")
            .field("field", &self.field)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Waiting for the value of step `i`
    AwaitingField(usize),
    Complete,
    Cancelled,
}

/// Result of feeding one input to a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Value accepted; ask the next question
    Next(String),
    /// Value rejected; same question again, prefixed by the reason
    Retry(String),
    /// All fields collected
    Complete(Payload),
    Cancelled,
    /// The flow had already ended
    Closed,
}

/// Linear intake state machine.
#[derive(Debug, Clone)]
pub struct IntakeFlow {
    steps: Vec<IntakeStep>,
    state: FlowState,
    payload: Payload,
    prompts: usize,
}

impl IntakeFlow {
    pub fn new(steps: Vec<IntakeStep>) -> Self {
        let state = if steps.is_empty() {
            FlowState::Complete
        } else {
            FlowState::AwaitingField(0)
        };
        Self {
            steps,
            state,
            payload: Payload::new(),
            prompts: 0,
        }
    }

    /// Flow collecting a price item: name, URL, then parser name.
    pub fn price_item(parser_names: Vec<String>) -> Self {
        let listed = parser_names.join(", ");
        Self::new(vec![
            IntakeStep::new("name", "Enter the item name:").validated(|input| {
                if input.trim().is_empty() {
                    Err("Name cannot be empty.".to_string())
                } else {
                    Ok(())
                }
            }),
            IntakeStep::new("url", "Enter the item URL:").validated(|input| {
                if is_web_url(input) {
                    Ok(())
                } else {
                    Err("That is not a valid http(s) URL.".to_string())
                }
            }),
            IntakeStep::new("parser", format!("Enter the parser name ({listed}):")).validated(
                move |input| {
                    if parser_names.iter().any(|name| name == input) {
                        Ok(())
                    } else {
                        Err(format!("Unknown parser. Available: {listed}."))
                    }
                },
            ),
        ])
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// How many times a question has been asked.
    pub fn prompt_count(&self) -> usize {
        self.prompts
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, FlowState::AwaitingField(_))
    }

    /// Question for the current step, counted as one prompt.
    pub fn prompt(&mut self) -> Option<String> {
        let FlowState::AwaitingField(i) = self.state else {
            return None;
        };
        self.prompts += 1;
        Some(self.steps[i].prompt.clone())
    }

    /// Feed one input to the current step.
    pub fn handle_input(&mut self, input: &str) -> StepOutcome {
        let FlowState::AwaitingField(i) = self.state else {
            return StepOutcome::Closed;
        };

        let value = input.trim();
        if value == CANCEL_COMMAND {
            self.cancel();
            return StepOutcome::Cancelled;
        }

        let step = &self.steps[i];
        if let Some(validator) = &step.validator {
            if let Err(reason) = validator(value) {
                self.prompts += 1;
                return StepOutcome::Retry(format!("{reason}\n{}", step.prompt));
            }
        }

        self.payload.insert(step.field.clone(), value.to_string());

        if i + 1 < self.steps.len() {
            self.state = FlowState::AwaitingField(i + 1);
            self.prompts += 1;
            StepOutcome::Next(self.steps[i + 1].prompt.clone())
        } else {
            self.state = FlowState::Complete;
            StepOutcome::Complete(std::mem::take(&mut self.payload))
        }
    }

    /// Abort the flow and drop collected values.
    pub fn cancel(&mut self) {
        if self.is_active() {
            self.state = FlowState::Cancelled;
            self.payload.clear();
        }
    }
}

/// Promote a completed payload to a tracked item.
pub fn into_tracked_item(payload: Payload) -> Result<TrackedItem> {
    let value = serde_json::to_value(&payload)?;
    let item: TrackedItem = serde_json::from_value(value)
        .map_err(|e| AppError::intake(format!("Collected item is incomplete: {e}")))?;

    for (field, value) in [("name", &item.name), ("url", &item.url), ("parser", &item.parser)] {
        if value.trim().is_empty() {
            return Err(AppError::intake(format!("Collected item has an empty {field}")));
        }
    }
    Ok(item)
}

fn is_web_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> IntakeFlow {
        IntakeFlow::price_item(vec!["perfumehub".to_string()])
    }

    #[test]
    fn test_happy_path() {
        let mut flow = flow();
        assert_eq!(flow.prompt().as_deref(), Some("Enter the item name:"));

        assert_eq!(
            flow.handle_input("  Perfume  "),
            StepOutcome::Next("Enter the item URL:".into())
        );
        assert!(matches!(
            flow.handle_input("https://perfumehub.pl/p/1"),
            StepOutcome::Next(_)
        ));

        let StepOutcome::Complete(payload) = flow.handle_input("perfumehub") else {
            panic!("flow should complete");
        };
        assert_eq!(flow.state(), FlowState::Complete);

        let item = into_tracked_item(payload).unwrap();
        assert_eq!(
            item,
            TrackedItem {
                name: "Perfume".into(),
                url: "https://perfumehub.pl/p/1".into(),
                parser: "perfumehub".into(),
            }
        );
    }

    #[test]
    fn test_invalid_url_stays_on_step() {
        let mut flow = flow();
        flow.prompt();
        flow.handle_input("Perfume");
        let before = flow.prompt_count();

        let outcome = flow.handle_input("not a url");
        assert!(matches!(outcome, StepOutcome::Retry(ref text) if text.ends_with("Enter the item URL:")));
        assert_eq!(flow.state(), FlowState::AwaitingField(1));
        assert_eq!(flow.prompt_count(), before + 1);

        assert!(matches!(flow.handle_input("ftp://x.test/a"), StepOutcome::Retry(_)));
        assert_eq!(flow.state(), FlowState::AwaitingField(1));
    }

    #[test]
    fn test_unknown_parser_rejected() {
        let mut flow = flow();
        flow.handle_input("Perfume");
        flow.handle_input("https://x.test");
        assert!(matches!(flow.handle_input("nope"), StepOutcome::Retry(_)));
        assert_eq!(flow.state(), FlowState::AwaitingField(2));
    }

    #[test]
    fn test_cancel_from_any_step() {
        for answered in 0..3 {
            let mut flow = flow();
            let answers = ["Perfume", "https://x.test", "perfumehub"];
            for answer in &answers[..answered] {
                flow.handle_input(answer);
            }
            assert_eq!(flow.handle_input("/cancel"), StepOutcome::Cancelled);
            assert_eq!(flow.state(), FlowState::Cancelled);
            assert_eq!(flow.handle_input("perfumehub"), StepOutcome::Closed);
        }
    }

    #[test]
    fn test_incomplete_payload_is_intake_error() {
        let payload: Payload = [("name".to_string(), "A".to_string())].into_iter().collect();
        assert!(matches!(into_tracked_item(payload), Err(AppError::Intake(_))));

        let payload: Payload = [
            ("name".to_string(), "A".to_string()),
            ("url".to_string(), "".to_string()),
            ("parser".to_string(), "p".to_string()),
        ]
        .into_iter()
        .collect();
        assert!(matches!(into_tracked_item(payload), Err(AppError::Intake(_))));
    }
}
