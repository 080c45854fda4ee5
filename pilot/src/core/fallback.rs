//! Deterministic fallback templates for failed generation.
//!
//! An ordered list of (named predicate, template) pairs; the first matching
//! rule wins and a catch-all guarantees a template for any task. Pure text
//! in, pure text out: no randomness, no clocks, no external calls, so the
//! same task always yields the same template.

const ZERO_TO_TEN: &str = r#"def print_numbers():
    # Print numbers from 0 to 10
    for i in range(11):
        print(i)

if __name__ == '__main__':
    print_numbers()"#;

const ONE_TO_TEN: &str = r#"def print_numbers():
    # Print numbers from 1 to 10
    for i in range(1, 11):
        print(i)

if __name__ == '__main__':
    print_numbers()"#;

const ASTERISK_GRID: &str = r#"def print_grid(size=4):
    # Print a grid of asterisks
    for i in range(size):
        print('* ' * size)

if __name__ == '__main__':
    print_grid()"#;

const GREETING: &str = r#"def greet():
    # Print a greeting message
    print("Hello, World!")

if __name__ == '__main__':
    greet()"#;

const NOOP: &str = r#"def main():
    # This is a simple Python script
    print("Hello, World!")
    print("This script was generated automatically.")

if __name__ == '__main__':
    main()"#;

/// Lowercased task text with a word index for standalone-token checks.
struct TaskText {
    lower: String,
    words: Vec<String>,
}

impl TaskText {
    fn new(task: &str) -> Self {
        let lower = task.to_lowercase();
        let words = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        Self { lower, words }
    }

    fn mentions(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    /// Standalone-word match, so `"10"` does not count as evidence of `"0"`.
    fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

struct FallbackRule {
    name: &'static str,
    applies: fn(&TaskText) -> bool,
    template: &'static str,
}

fn wants_zero_to_ten(task: &TaskText) -> bool {
    wants_numbers(task) && task.has_word("0") && task.has_word("10")
}

fn wants_numbers(task: &TaskText) -> bool {
    task.mentions("print") && (task.mentions("number") || task.mentions("digit"))
}

fn wants_grid(task: &TaskText) -> bool {
    task.mentions("grid") && (task.mentions("*") || task.mentions("asterisk"))
}

fn wants_greeting(task: &TaskText) -> bool {
    task.mentions("hello") || task.mentions("greet")
}

fn always(_task: &TaskText) -> bool {
    true
}

/// Ordered first-match-wins rule list. The trailing catch-all makes
/// [`fallback_for_task`] total.
const RULES: [FallbackRule; 5] = [
    FallbackRule {
        name: "print-zero-to-ten",
        applies: wants_zero_to_ten,
        template: ZERO_TO_TEN,
    },
    FallbackRule {
        name: "print-one-to-ten",
        applies: wants_numbers,
        template: ONE_TO_TEN,
    },
    FallbackRule {
        name: "asterisk-grid",
        applies: wants_grid,
        template: ASTERISK_GRID,
    },
    FallbackRule {
        name: "greeting",
        applies: wants_greeting,
        template: GREETING,
    },
    FallbackRule {
        name: "no-op",
        applies: always,
        template: NOOP,
    },
];

/// Return the canned template for a task description.
pub fn fallback_for_task(task: &str) -> &'static str {
    let (_, template) = fallback_rule_for_task(task);
    template
}

/// Same as [`fallback_for_task`] but also names the rule that fired, for
/// logging.
pub fn fallback_rule_for_task(task: &str) -> (&'static str, &'static str) {
    let text = TaskText::new(task);
    let rule = RULES
        .iter()
        .find(|rule| (rule.applies)(&text))
        .expect("catch-all rule always matches");
    (rule.name, rule.template)
}
