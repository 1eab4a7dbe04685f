/// Quick questions by category, numbered 1..=20 in this order
pub static CATEGORIES: [(&str, [&str; 5]); 4] = [
    (
        "Performance",
        [
            "What's my current CPU and memory usage?",
            "Show me the top processes consuming resources",
            "Perform a comprehensive system health check",
            "What's my disk space and I/O performance?",
            "How can I optimize my system performance?",
        ],
    ),
    (
        "Security",
        [
            "Perform a basic security scan",
            "Check for any security concerns or recommendations",
            "What security services are running?",
            "Show me recent security-related events",
            "Are there any open network ports I should know about?",
        ],
    ),
    (
        "Troubleshooting",
        [
            "Are there any recent system errors or warnings?",
            "Help me diagnose a system problem",
            "What services are currently running?",
            "Check system logs for issues",
            "Why is my system running slowly?",
        ],
    ),
    (
        "Information",
        [
            "Show me my network configuration and status",
            "What's my system uptime and basic information?",
            "What software is installed on my system?",
            "Show me system temperature and thermal status",
            "Display battery status (if applicable)",
        ],
    ),
];

pub const QUESTION_COUNT: usize = 20;

/// Quick question `number` (1-based)
pub fn question(number: usize) -> Option<&'static str> {
    let index = number.checked_sub(1)?;
    CATEGORIES
        .iter()
        .flat_map(|(_, questions)| questions.iter().copied())
        .nth(index)
}

/// Expand a question number into its text; anything else is returned as typed
pub fn resolve_question(input: &str) -> String {
    let input = input.trim();
    input
        .parse::<usize>()
        .ok()
        .and_then(question)
        .map(str::to_string)
        .unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_map_across_categories() {
        assert_eq!(resolve_question("1"), "What's my current CPU and memory usage?");
        assert_eq!(resolve_question(" 6 "), "Perform a basic security scan");
        assert_eq!(resolve_question("15"), "Why is my system running slowly?");
        assert_eq!(resolve_question("20"), "Display battery status (if applicable)");
    }

    #[test]
    fn test_out_of_range_and_text_pass_through() {
        assert_eq!(resolve_question("0"), "0");
        assert_eq!(resolve_question("21"), "21");
        assert_eq!(resolve_question("is nginx up?"), "is nginx up?");
    }

    #[test]
    fn test_question_count() {
        let total: usize = CATEGORIES.iter().map(|(_, q)| q.len()).sum();
        assert_eq!(total, QUESTION_COUNT);
        assert!(question(QUESTION_COUNT + 1).is_none());
    }
}
