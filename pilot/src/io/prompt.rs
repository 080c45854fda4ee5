//! Prompt rendering for plan and code generation.

use minijinja::{Environment, context};

const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
const CODE_TEMPLATE: &str = include_str!("prompts/code.md");

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("plan", PLAN_TEMPLATE)
            .expect("plan template should be valid");
        env.add_template("code", CODE_TEMPLATE)
            .expect("code template should be valid");
        Self { env }
    }
}

/// Render the plan-generation prompt.
///
/// On retries `failure` carries the prior attempt's failure description so
/// the model can refine the plan.
pub fn plan_prompt(task: &str, failure: Option<&str>) -> String {
    let engine = PromptEngine::new();
    let template = engine
        .env
        .get_template("plan")
        .expect("plan template is registered");
    template
        .render(context! {
            task => task.trim(),
            failure => failure.map(str::trim).filter(|s| !s.is_empty()),
        })
        .expect("plan template rendering should not fail")
}

/// Render the code-generation prompt for one code-producing step.
pub fn code_prompt(task: &str) -> String {
    let engine = PromptEngine::new();
    let template = engine
        .env
        .get_template("code")
        .expect("code template is registered");
    template
        .render(context! { task => task.trim() })
        .expect("code template rendering should not fail")
}
