use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;

use crate::tools::Confirmer;

/// Line-oriented terminal I/O shared by the shell and the confirmation prompt
///
/// A single reader owns stdin so a tool asking for confirmation mid-query never
/// races the shell for input.
pub struct Console {
    lines: Mutex<Lines<Box<dyn AsyncBufRead + Send + Unpin>>>,
}

impl Console {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    /// Read replies from `reader` instead of stdin
    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Print `prompt` without a newline and read one line; `None` on end of input
    pub async fn prompt(&self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        lines.next_line().await
    }

    /// Yes/no question; an empty reply or closed input picks `default`
    pub async fn confirm(&self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        match self.prompt(&format!("{} {}: ", question, hint)).await {
            Ok(Some(reply)) => parse_yes_no(&reply, default),
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read confirmation");
                default
            }
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_yes_no(reply: &str, default: bool) -> bool {
    match reply.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    }
}

#[async_trait]
impl Confirmer for Console {
    async fn ask(&self, command: &str) -> String {
        println!("\n⚠️  SYSTEM ACTION REQUESTED ⚠️");
        println!("Command: {}", command);
        println!("This command will modify your system.");
        match self.prompt("Do you want to proceed? (yes/no): ").await {
            Ok(Some(reply)) => reply,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read confirmation");
                String::new()
            }
        }
    }
}
