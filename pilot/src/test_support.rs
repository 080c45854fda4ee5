//! Test-only scripted fakes for the model and approval seams.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::plan::Plan;
use crate::io::console::Approval;
use crate::io::model::Completion;

/// One scripted answer from the fake model.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Text(String),
    Fail(String),
}

/// Completion fake returning queued responses in order.
///
/// Every prompt it sees is recorded for assertions. When the queue drains,
/// the optional default response repeats; without one, further calls are an
/// error (a test bug).
pub struct ScriptedCompletion {
    responses: RefCell<VecDeque<ScriptedResponse>>,
    default: Option<ScriptedResponse>,
    pub prompts: RefCell<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            default: None,
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Fake whose every call fails with `message`, like an unreachable API.
    pub fn always_failing(message: &str) -> Self {
        Self {
            responses: RefCell::new(VecDeque::new()),
            default: Some(ScriptedResponse::Fail(message.to_string())),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Queued responses first, then `default` forever.
    pub fn with_default(responses: Vec<ScriptedResponse>, default: ScriptedResponse) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            default: Some(default),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl Completion for ScriptedCompletion {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .or_else(|| self.default.clone())
            .ok_or_else(|| anyhow!("no scripted completion left"))?;
        match response {
            ScriptedResponse::Text(text) => Ok(text),
            ScriptedResponse::Fail(message) => Err(anyhow!("{message}")),
        }
    }
}

/// Approval fake returning queued decisions in order.
///
/// Every plan it sees is recorded for assertions.
pub struct ScriptedApproval {
    decisions: VecDeque<bool>,
    default: Option<bool>,
    pub seen: Vec<Plan>,
}

impl ScriptedApproval {
    pub fn with_decisions(decisions: Vec<bool>) -> Self {
        Self {
            decisions: decisions.into(),
            default: None,
            seen: Vec::new(),
        }
    }

    pub fn always_yes() -> Self {
        Self {
            decisions: VecDeque::new(),
            default: Some(true),
            seen: Vec::new(),
        }
    }

    pub fn always_no() -> Self {
        Self {
            decisions: VecDeque::new(),
            default: Some(false),
            seen: Vec::new(),
        }
    }
}

impl Approval for ScriptedApproval {
    fn approve_plan(&mut self, plan: &Plan) -> Result<bool> {
        self.seen.push(plan.clone());
        self.decisions
            .pop_front()
            .or(self.default)
            .ok_or_else(|| anyhow!("no scripted approval decision left"))
    }
}
