//! Evaluation traces.
//!
//! A trace is the append-only record of the sub-checks a schema run took:
//! one [`Step`] per schema node evaluated, nesting an inner trace for the
//! node's own sub-evaluations (which branch of an `any` was tried, which
//! array index failed, ...). Traces exist purely for diagnostics; they never
//! affect the verdict.

use std::fmt::Write as _;

use colored::Colorize;

use crate::schema::Schema;
use crate::value::Value;

// ------------------------------- Types ------------------------------------ //

/// One evaluation step: a schema node, the value it saw, the outcome, and
/// the sub-evaluations it performed.
#[derive(Debug, Clone)]
pub struct Step {
    pub schema: Schema,
    pub value: Value,
    pub matched: bool,
    pub inner: Trace,
}

/// An ordered sequence of [`Step`]s. A finished trace is an immutable
/// snapshot owned by the `Match` it came back with.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    steps: Vec<Step>,
}

/// Structural equality: same shape, same outcomes, same values, and the
/// same schema nodes (by identity, since predicates have no equality).
impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        Schema::ptr_eq(&self.schema, &other.schema)
            && self.value == other.value
            && self.matched == other.matched
            && self.inner == other.inner
    }
}

impl PartialEq for Trace {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl Trace {
    pub fn new() -> Self {
        Trace { steps: Vec::new() }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
}

// ----------------------------- Rendering ---------------------------------- //

/// Render a trace as indented plain text, one line per step: the verdict,
/// the schema's tag (and label, when set), and the value at that point. The
/// value is only printed when it changed from the previous line, so
/// combinators that keep re-checking the same value don't repeat it.
pub fn format_trace(trace: &Trace) -> String {
    let mut out = String::new();
    let mut last_shown = String::new();
    render(trace, 0, &mut last_shown, &mut out, false);
    out
}

/// Same rendering with ANSI colors on the verdicts, for terminals.
pub fn format_trace_color(trace: &Trace) -> String {
    let mut out = String::new();
    let mut last_shown = String::new();
    render(trace, 0, &mut last_shown, &mut out, true);
    out
}

fn render(trace: &Trace, depth: usize, last_shown: &mut String, out: &mut String, color: bool) {
    for step in &trace.steps {
        let verdict = match (step.matched, color) {
            (true, false) => "pass".to_string(),
            (false, false) => "fail".to_string(),
            (true, true) => "pass".green().to_string(),
            (false, true) => "fail".red().bold().to_string(),
        };
        let head = match step.schema.label() {
            Some(label) => format!("{} ({})", step.schema.tag(), label),
            None => step.schema.tag().to_string(),
        };
        for _ in 0..depth {
            out.push_str("  ");
        }
        let shown = step.value.to_string();
        if shown == *last_shown {
            let _ = writeln!(out, "{verdict} {head}");
        } else {
            let _ = writeln!(out, "{verdict} {head} on {shown}");
            *last_shown = shown;
        }
        render(&step.inner, depth + 1, last_shown, out, color);
    }
}

/// Single-sentence reason for a failed run: follows the failing path to the
/// deepest failing step and names it. Used by `violates_schema` where
/// callers want one message rather than the whole tree.
pub(crate) fn failure_message(trace: &Trace) -> String {
    let Some(mut step) = trace.steps.last() else {
        return "schema did not match".to_string();
    };
    // Follow the failing path down; prefer the deepest step that carries a
    // label, since anonymous leaf conditions make for opaque messages.
    let mut described = step.schema.label().map(|_| step);
    while let Some(deeper) = step.inner.steps.iter().rev().find(|s| !s.matched) {
        step = deeper;
        if step.schema.label().is_some() {
            described = Some(step);
        }
    }
    let step = described.unwrap_or(step);
    let what = step
        .schema
        .label()
        .unwrap_or_else(|| step.schema.tag().to_string());
    format!("{} does not satisfy {}", step.value, what)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{any, every};
    use crate::primitives::{condition, greater_than, number};

    #[test]
    fn formatted_trace_has_one_line_per_step() {
        let schema = every(vec![number(), greater_than(0)]);
        let outcome = schema.test(&Value::Number(5.0));
        assert!(outcome.matched);
        let text = format_trace(&outcome.trace);
        // Every + Number + (GreaterThan + its Number + its Condition)
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() >= 3, "expected a nested rendering, got:\n{text}");
        assert!(lines[0].starts_with("pass Every"));
        // Same value throughout: only the first line prints it.
        assert_eq!(lines.iter().filter(|l| l.contains("on 5")).count(), 1);
    }

    #[test]
    fn value_reprinted_when_it_changes() {
        let schema = crate::containers::array(number());
        let outcome = schema.test(&Value::from(serde_json::json!([1, 2])));
        let text = format_trace(&outcome.trace);
        // Item steps see 1 and 2, each printed once at its step.
        assert!(text.contains("on 1"), "missing item value in:\n{text}");
        assert!(text.contains("on 2"), "missing item value in:\n{text}");
    }

    #[test]
    fn color_rendering_matches_plain_rendering() {
        let schema = every(vec![number(), greater_than(0)]);
        let outcome = schema.test(&Value::Number(-1.0));
        // Forced on: the verdicts carry ANSI escapes.
        colored::control::set_override(true);
        let colorized = format_trace_color(&outcome.trace);
        assert!(
            colorized.contains("\u{1b}["),
            "expected ANSI escapes in:\n{colorized}"
        );
        // Forced off: byte-for-byte the plain rendering.
        colored::control::set_override(false);
        let uncolorized = format_trace_color(&outcome.trace);
        colored::control::unset_override();
        assert_eq!(uncolorized, format_trace(&outcome.trace));
    }

    #[test]
    fn failure_message_names_the_deepest_failing_check() {
        let schema = any(vec![condition(|_| false).with_label("a lost cause")]);
        let outcome = schema.test(&Value::Number(7.0));
        assert!(!outcome.matched);
        let message = failure_message(&outcome.trace);
        assert!(
            message.contains("a lost cause"),
            "unexpected message: {message}"
        );
        assert!(message.contains('7'), "unexpected message: {message}");
    }
}
