use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map};
use tokio_util::sync::CancellationToken;

use super::console::Console;
use super::questions::resolve_question;
use super::render::{display_name, panel, patterns_table, questions_table, steps_panel, welcome};
use super::suggestions::contextual_suggestions;
use super::{App, CliError};
use crate::config::AgentPattern;
use crate::memory::MemoryManager;
use crate::patterns::{describe, AgentStrategy, QueryOutcome, AVAILABLE_PATTERNS};
use crate::system::platform_name;

/// Shell commands other than questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Status,
    Questions,
    Patterns,
    Memory,
    Collect,
    Cache,
}

impl Command {
    fn parse(input: &str) -> Option<Self> {
        Some(match input.trim().to_lowercase().as_str() {
            "quit" | "exit" => Command::Quit,
            "status" => Command::Status,
            "questions" | "q" | "help" => Command::Questions,
            "patterns" | "pattern" | "p" => Command::Patterns,
            "memory" | "m" => Command::Memory,
            "collect" => Command::Collect,
            "cache" => Command::Cache,
            _ => return None,
        })
    }
}

/// The interactive read-eval loop
pub struct Shell {
    app: App,
    console: Arc<Console>,
    memory: MemoryManager,
    pattern: AgentPattern,
    strategy: Box<dyn AgentStrategy>,
    started: Instant,
}

impl Shell {
    /// Build the shell on `pattern`, falling back to ReAct if it cannot be created
    pub async fn new(app: App, console: Arc<Console>, pattern: AgentPattern) -> Result<Self, CliError> {
        let memory = MemoryManager::load(app.settings.memory_file.clone()).await;
        let (pattern, strategy) = match app.strategy(pattern) {
            Ok(strategy) => (pattern, strategy),
            Err(e) => {
                println!("Error initializing agent: {}", e);
                (AgentPattern::React, app.strategy(AgentPattern::React)?)
            }
        };
        println!("✓ Initialized {} agent pattern", pattern);

        Ok(Self {
            app,
            console,
            memory,
            pattern,
            strategy,
            started: Instant::now(),
        })
    }

    /// Run until the user quits or input ends
    pub async fn run(&mut self) -> Result<(), CliError> {
        println!("{}", welcome(self.pattern));

        if self
            .console
            .confirm("\nWould you like to see available questions?", true)
            .await
        {
            println!("{}", questions_table());
        }

        let token = CancellationToken::new();
        let collection = self.app.start_background_collection(token.clone());

        if self
            .console
            .confirm("\nPerform initial system data collection?", true)
            .await
        {
            self.force_collection().await;
        }

        let result = self.read_eval_loop().await;

        token.cancel();
        if let Some(handle) = collection {
            let _ = handle.await;
        }
        result
    }

    async fn read_eval_loop(&mut self) -> Result<(), CliError> {
        loop {
            let prompt = format!("\n❯ Ask a question (Current: {}): ", self.pattern);
            let line = tokio::select! {
                line = self.console.prompt(&prompt) => line?,
                _ = tokio::signal::ctrl_c() => {
                    if !exit_requested(&self.console).await {
                        continue;
                    }
                    None
                }
            };
            let Some(line) = line else {
                println!("\nGoodbye! 👋");
                return Ok(());
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match Command::parse(input) {
                Some(Command::Quit) => {
                    println!("Goodbye! 👋");
                    return Ok(());
                }
                Some(Command::Status) => self.show_status().await,
                Some(Command::Questions) => println!("{}", questions_table()),
                Some(Command::Patterns) => self.switch_pattern().await,
                Some(Command::Memory) => {
                    println!("{}", panel("💭 Conversation Memory", &self.memory.session_summary()))
                }
                Some(Command::Collect) => self.force_collection().await,
                Some(Command::Cache) => self.manage_cache().await,
                None => {
                    if !self.ask(input).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Answer one question; `false` when the user chose to exit after Ctrl+C
    async fn ask(&mut self, input: &str) -> bool {
        let question = resolve_question(input);
        if question != input {
            println!("Processing: {}", question);
        }
        println!("🧠 {} agent thinking...", display_name(self.pattern));

        let outcome = tokio::select! {
            outcome = self.strategy.execute_query(&question) => outcome,
            _ = tokio::signal::ctrl_c() => {
                println!("\nOperation cancelled.");
                return !exit_requested(&self.console).await;
            }
        };

        self.show_outcome(&question, &outcome).await;
        true
    }

    async fn show_outcome(&mut self, question: &str, outcome: &QueryOutcome) {
        let output = if outcome.output.is_empty() {
            "No response generated"
        } else {
            outcome.output.as_str()
        };
        let title = format!("🤖 {} Agent Response", display_name(self.pattern));
        println!("{}", panel(&title, output));

        // Count before recording so the current question does not match itself
        let related = self.memory.get_relevant_context(question, 3).len();

        let mut context = Map::new();
        context.insert("pattern".into(), json!(self.pattern.as_str()));
        if outcome.error {
            context.insert("error".into(), json!(true));
        }
        if let Err(e) = self.memory.add_interaction(question, output, context).await {
            tracing::warn!(error = %e, "Could not persist interaction");
        }

        println!();
        for line in contextual_suggestions(self.pattern, question, related) {
            println!("{}", line);
        }

        if let Some(steps) = steps_panel(&outcome.steps) {
            if self.console.confirm("\nShow execution details?", false).await {
                println!("{}", steps);
            }
        }
    }

    async fn switch_pattern(&mut self) {
        println!("{}", patterns_table(self.pattern));
        let choices = AVAILABLE_PATTERNS
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let prompt = format!("\nSelect agent pattern [{}] ({}): ", choices, self.pattern);

        let reply = match self.console.prompt(&prompt).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read pattern choice");
                return;
            }
        };
        let choice = match reply.trim() {
            "" => self.pattern,
            text => match text.parse::<AgentPattern>() {
                Ok(pattern) if AVAILABLE_PATTERNS.contains(&pattern) => pattern,
                _ => {
                    println!("Unknown pattern '{}'; choose one of {}", text, choices);
                    return;
                }
            },
        };

        if choice == self.pattern {
            println!("No change made");
            return;
        }

        println!("Switching from {} to {}...", self.pattern, choice);
        match self.app.strategy(choice) {
            Ok(strategy) => {
                self.strategy = strategy;
                self.pattern = choice;
                println!("✓ Successfully switched to {} pattern", choice);
                println!("{}", describe(choice));
            }
            Err(e) => println!("Error initializing agent: {}", e),
        }
    }

    async fn show_status(&self) {
        let settings = &self.app.settings;
        let enabled = |on: bool| if on { "Enabled" } else { "Disabled" };
        let last = match self.app.indexer.last_run().await {
            Some(at) => at.to_rfc3339(),
            None => "Never".to_string(),
        };

        let system = format!(
            "Platform: {}\nSession Duration: {}s\nLast Data Collection: {}\n\
             Background Collection: {}\nIndexed Chunks: {}",
            platform_name(),
            self.started.elapsed().as_secs(),
            last,
            enabled(settings.enable_background_collection),
            self.app.vector_store.len().await
        );
        let agent = format!(
            "Current Pattern: {}\nAgent Mode: {:?}\nMax Iterations: {}\nSafe Mode: {}",
            display_name(self.pattern),
            settings.agent_mode,
            settings.max_iterations,
            enabled(settings.safe_mode)
        );
        let cache = match &self.app.cache {
            Some(_) => format!("Cache: Enabled\nTTL: {} seconds", settings.cache_ttl_seconds),
            None => "Cache: Disabled".to_string(),
        };

        println!("{}", panel("System Status", &system));
        println!("{}", panel("Agent Configuration", &agent));
        println!("{}", panel("Memory Status", &self.memory.session_summary()));
        println!("{}", panel("Cache Status", &cache));
    }

    async fn force_collection(&self) {
        println!("🔄 Collecting system data...");
        match self.app.indexer.collect("manual").await {
            Ok(chunks) => println!("✓ Data collection completed ({} chunks indexed)", chunks),
            Err(e) => println!("Error during collection: {}", e),
        }
    }

    async fn manage_cache(&self) {
        let Some(cache) = &self.app.cache else {
            println!("Cache is disabled");
            return;
        };

        let reply = match self
            .console
            .prompt("Cache action [clear_expired/clear_all/status] (status): ")
            .await
        {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read cache action");
                return;
            }
        };

        match reply.trim() {
            "clear_expired" => match cache.clear_expired().await {
                Ok(n) => println!("✓ Expired cache entries cleared ({})", n),
                Err(e) => println!("Error clearing cache: {}", e),
            },
            "clear_all" => {
                if self.console.confirm("Clear all cache entries?", false).await {
                    match cache.clear_all().await {
                        Ok(n) => println!("✓ All cache entries cleared ({})", n),
                        Err(e) => println!("Error clearing cache: {}", e),
                    }
                }
            }
            "" | "status" => match cache.stats().await {
                Ok(stats) => println!(
                    "Cache TTL: {} seconds\nEntries: {} ({} expired)",
                    self.app.settings.cache_ttl_seconds, stats.entries, stats.expired
                ),
                Err(e) => println!("Error reading cache: {}", e),
            },
            other => println!("Unknown cache action '{}'", other),
        }
    }
}

/// Ask after Ctrl+C whether to leave; anything but yes keeps the shell running
async fn exit_requested(console: &Console) -> bool {
    println!();
    console.confirm("Exit application?", false).await
}
