//! Plain-text rendering for the shell
//!
//! Everything here returns a `String` so the shell decides where it goes.

use std::fmt::Write as _;

use super::questions::CATEGORIES;
use crate::config::AgentPattern;
use crate::patterns::{describe, AVAILABLE_PATTERNS};

const RULE_WIDTH: usize = 64;

/// `plan_execute` -> `Plan Execute`
pub fn display_name(pattern: AgentPattern) -> String {
    pattern
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `body` between two rules, the top one carrying `title`
pub fn panel(title: &str, body: &str) -> String {
    let head = format!("── {} ", title);
    let fill = RULE_WIDTH.saturating_sub(head.chars().count());
    format!(
        "{}{}\n{}\n{}",
        head,
        "─".repeat(fill),
        body.trim_end(),
        "─".repeat(RULE_WIDTH)
    )
}

pub fn welcome(pattern: AgentPattern) -> String {
    let body = format!(
        "🤖 AI System Administrator Assistant\n\
         Multiple agent patterns over a local knowledge base of this machine\n\n\
         Current Agent Pattern: {}\n\
         Description: {}\n\n\
         Available Commands:\n\
         • Type a number (1-20) to select a quick question\n\
         • Type 'questions' to see all available questions by category\n\
         • Type 'patterns' to switch agent patterns\n\
         • Type 'status' for system overview\n\
         • Type 'memory' to view conversation history\n\
         • Type 'collect' to force data collection\n\
         • Type 'cache' to manage cache\n\
         • Ask any custom system-related question\n\
         • Type 'quit' or 'exit' to leave",
        display_name(pattern),
        describe(pattern)
    );
    panel("Welcome", &body)
}

pub fn questions_table() -> String {
    let mut out = String::new();
    let mut number = 1;
    for (category, questions) in CATEGORIES.iter() {
        let mut body = String::new();
        for question in questions {
            let _ = writeln!(body, "{:>4}  {}", number, question);
            number += 1;
        }
        out.push_str(&panel(&format!("📋 {} Questions", category), &body));
        out.push_str("\n\n");
    }
    out.push_str("💡 Tip: Just type the number (1-20) to ask that question!");
    out
}

pub fn patterns_table(current: AgentPattern) -> String {
    let mut body = String::new();
    for pattern in AVAILABLE_PATTERNS {
        let marker = if pattern == current { "✓" } else { " " };
        let _ = writeln!(
            body,
            "{} {:<16} {}",
            marker,
            pattern.as_str(),
            describe(pattern)
        );
    }
    panel("🧠 Available Agent Patterns", &body)
}

/// Numbered execution steps, or `None` when there were none
pub fn steps_panel(steps: &[String]) -> Option<String> {
    if steps.is_empty() {
        return None;
    }
    let body = steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("Step {}: {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");
    Some(panel("🔍 Execution Steps", &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(AgentPattern::PlanExecute), "Plan Execute");
        assert_eq!(display_name(AgentPattern::React), "React");
    }

    #[test]
    fn test_panel_layout() {
        let text = panel("Title", "line one\nline two\n");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("── Title ─"));
        assert_eq!(lines[0].chars().count(), RULE_WIDTH);
        assert_eq!(lines[1], "line one");
        assert_eq!(lines[3].chars().count(), RULE_WIDTH);
    }

    #[test]
    fn test_questions_table_numbers_all_questions() {
        let table = questions_table();
        assert!(table.contains("   1  What's my current CPU and memory usage?"));
        assert!(table.contains("  20  Display battery status (if applicable)"));
        assert!(table.contains("📋 Security Questions"));
    }

    #[test]
    fn test_patterns_table_marks_current() {
        let table = patterns_table(AgentPattern::SelfAsk);
        assert!(table.contains("✓ self_ask"));
        assert!(table.contains("  react"));
    }

    #[test]
    fn test_steps_panel() {
        assert!(steps_panel(&[]).is_none());
        let text = steps_panel(&["rag_query -> ok".to_string()]).unwrap();
        assert!(text.contains("Step 1: rag_query -> ok"));
    }
}
