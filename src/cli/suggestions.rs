use crate::config::AgentPattern;

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Follow-up hints shown after an answer
///
/// `related` is how many earlier interactions share words with `question`.
pub fn contextual_suggestions(pattern: AgentPattern, question: &str, related: usize) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();
    let question = question.to_lowercase();

    match pattern {
        AgentPattern::MultiAgent => suggestions
            .push("💡 Multi-agent analysis provides comprehensive insights from specialists".into()),
        AgentPattern::PlanExecute => suggestions
            .push("💡 Plan-Execute pattern breaks down complex tasks systematically".into()),
        _ => {}
    }

    let topical: &[&str] = if mentions_any(&question, &["cpu", "memory", "performance"]) {
        &[
            "🔍 Try: 'Perform a comprehensive system health check'",
            "📊 Consider: Regular performance monitoring",
            "⚡ Optimization: Check startup programs and services",
        ]
    } else if mentions_any(&question, &["error", "problem", "issue"]) {
        &[
            "🔍 Try: 'Check system logs for issues'",
            "🛠️ Consider: Running system diagnostics",
            "📋 Next: Document the issue for future reference",
        ]
    } else if mentions_any(&question, &["security", "vulnerability"]) {
        &[
            "🔒 Try: 'Perform a basic security scan'",
            "🛡️ Consider: Regular security updates",
            "📋 Review: Security best practices",
        ]
    } else {
        &[]
    };
    suggestions.extend(topical.iter().map(|s| s.to_string()));

    if related > 0 {
        suggestions.push(format!(
            "📚 Related: You asked similar questions {} time(s) before",
            related
        ));
    }

    if suggestions.is_empty() {
        suggestions = vec![
            "💡 Tip: Type 'questions' to see all available options".into(),
            "🔄 Try: Different agent patterns for varied approaches".into(),
            "📊 Consider: Regular system monitoring".into(),
        ];
    }
    suggestions
}
