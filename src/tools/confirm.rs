use async_trait::async_trait;

/// Asks the operator whether a system-modifying command may run
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Present `command` and return the operator's raw reply
    async fn ask(&self, command: &str) -> String;
}

/// Only `yes` and `y` (any case, surrounding whitespace ignored) approve
pub fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Answers every prompt with the same reply; for non-interactive runs
#[derive(Debug, Clone)]
pub struct FixedReply(pub String);

impl FixedReply {
    pub fn deny() -> Self {
        Self("no".to_string())
    }
}

#[async_trait]
impl Confirmer for FixedReply {
    async fn ask(&self, command: &str) -> String {
        tracing::info!(%command, reply = %self.0, "Answering confirmation prompt");
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_replies() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative(" Y\n"));
        assert!(is_affirmative("YES"));
        assert!(!is_affirmative("yeah"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("no"));
    }
}
