//! Code synthesis pipeline for code-producing steps.
//!
//! Generate → normalize → validate, substituting a deterministic fallback
//! template when the model call fails or the normalized text does not pass
//! the validator. The returned artifact is always executable-looking:
//! nothing with `valid == false` leaves this module.

use tracing::{debug, instrument, warn};

use crate::core::fallback::fallback_rule_for_task;
use crate::core::normalize::normalize_code;
use crate::core::types::{CodeArtifact, CodeSource};
use crate::core::validate::looks_like_python;
use crate::io::model::Completion;
use crate::io::prompt::code_prompt;

/// Produce a code artifact for `task`.
#[instrument(skip_all, fields(task_bytes = task.len()))]
pub fn generate_artifact<M: Completion>(model: &M, task: &str) -> CodeArtifact {
    let prompt = code_prompt(task);
    let raw = match model.complete(&prompt) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(err = %err, "code generation failed, using fallback template");
            return fallback_artifact(task, String::new());
        }
    };

    let code = normalize_code(&raw);
    if looks_like_python(&code) {
        debug!(bytes = code.len(), "generated code accepted");
        return CodeArtifact {
            raw,
            code,
            valid: true,
            source: CodeSource::Generated,
        };
    }

    warn!("generated code does not look like Python, using fallback template");
    fallback_artifact(task, raw)
}

fn fallback_artifact(task: &str, raw: String) -> CodeArtifact {
    let (rule, template) = fallback_rule_for_task(task);
    debug!(rule, "selected fallback template");
    CodeArtifact {
        raw,
        code: template.to_string(),
        valid: true,
        source: CodeSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedCompletion, ScriptedResponse};

    #[test]
    fn valid_completion_is_normalized_and_kept() {
        let model = ScriptedCompletion::new(vec![ScriptedResponse::Text(
            "```python\ndef count():\nfor i in range(3):\nprint(i)\n```".to_string(),
        )]);

        let artifact = generate_artifact(&model, "count to three");

        assert_eq!(artifact.source, CodeSource::Generated);
        assert!(artifact.valid);
        assert!(artifact.code.contains("def count():"));
        assert!(artifact.code.contains("    print(i)"));
        assert!(!artifact.code.contains("```"));
    }

    #[test]
    fn foreign_markup_falls_back_to_template() {
        let model = ScriptedCompletion::new(vec![ScriptedResponse::Text(
            "<html><body>print numbers</body></html>".to_string(),
        )]);

        let artifact = generate_artifact(&model, "print numbers from 1 to 10");

        assert_eq!(artifact.source, CodeSource::Fallback);
        assert!(artifact.valid);
        assert!(artifact.code.contains("range(1, 11)"));
        // The raw completion is retained for inspection.
        assert!(artifact.raw.contains("<html>"));
    }

    #[test]
    fn transport_error_falls_back_to_template() {
        let model = ScriptedCompletion::always_failing("connection refused");

        let artifact = generate_artifact(&model, "say hello");

        assert_eq!(artifact.source, CodeSource::Fallback);
        assert!(artifact.code.contains("Hello, World!"));
        assert!(artifact.raw.is_empty());
    }
}
