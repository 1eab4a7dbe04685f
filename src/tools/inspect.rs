//! Read-only inspection tools backed by the live probes

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use sysadmin_tool_macros::tool;

use super::{NoArgs, ToolContext};
use crate::config::Settings;
use crate::system::{probes, run_command, run_program};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LiveInfoArgs {
    /// A metric to read (cpu usage, memory, disk, processes, network, temperature,
    /// battery) or a read-only shell command
    pub command_or_request: String,
}

/// Which probe a free-form request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiveTopic {
    Cpu,
    Memory,
    Disk,
    Processes,
    Network,
    Thermal,
    Battery,
    Command,
}

fn route(request: &str) -> LiveTopic {
    let request = request.to_lowercase();
    let has = |word: &str| request.contains(word);
    if has("cpu") && has("usage") {
        LiveTopic::Cpu
    } else if has("memory") || has("ram") {
        LiveTopic::Memory
    } else if has("disk") {
        LiveTopic::Disk
    } else if has("process") {
        LiveTopic::Processes
    } else if has("network") {
        LiveTopic::Network
    } else if has("temperature") || has("thermal") {
        LiveTopic::Thermal
    } else if has("battery") {
        LiveTopic::Battery
    } else {
        LiveTopic::Command
    }
}

#[tool(description = "Get real-time system information or execute specific system commands")]
pub async fn live_system_info(ctx: Arc<ToolContext>, args: LiveInfoArgs) -> Result<String, String> {
    let request = args.command_or_request;
    let report = match route(&request) {
        LiveTopic::Cpu => probes::cpu_usage().await,
        LiveTopic::Memory => probes::memory().await,
        LiveTopic::Disk => probes::disks().await,
        LiveTopic::Processes => probes::top_processes_report().await,
        LiveTopic::Network => probes::network().await,
        LiveTopic::Thermal => probes::thermal().await,
        LiveTopic::Battery => probes::battery().await,
        LiveTopic::Command => execute_safe_command(&ctx.settings, &request).await,
    };
    Ok(report)
}

/// Characters that would let a shell run something besides the allowlisted program
const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '$', '`', '<', '>', '(', ')', '\n', '\r'];

/// Run `command` if safe mode allows it
///
/// In safe mode the first word must be on the allowlist, shell metacharacters are
/// refused, and the words are passed to the program directly without a shell.
pub(crate) async fn execute_safe_command(settings: &Settings, command: &str) -> String {
    let output = if settings.safe_mode {
        let argv: Vec<&str> = command.split_whitespace().collect();
        let program = argv.first().copied().unwrap_or("");
        if !settings.allowed_commands.iter().any(|allowed| allowed == program) {
            tracing::warn!(%command, "Rejected command outside the allowlist");
            return format!(
                "Command '{}' is not in the safe commands list: {:?}",
                command, settings.allowed_commands
            );
        }
        if command.contains(SHELL_METACHARACTERS) {
            tracing::warn!(%command, "Rejected command with shell operators");
            return format!(
                "Command '{}' contains shell operators, which are not allowed in safe mode",
                command
            );
        }
        run_program(&argv).await
    } else {
        run_command(command).await
    };

    if output.success {
        output.stdout
    } else {
        format!("Command failed: {}", output.stderr)
    }
}

#[tool(description = "Perform comprehensive system health check")]
pub async fn system_health_check(_args: NoArgs) -> Result<String, String> {
    let (cpu, memory, disks, network) = tokio::join!(
        probes::cpu_usage(),
        probes::memory(),
        probes::disks(),
        probes::network()
    );
    Ok([
        format!("CPU Status: {}", cpu),
        format!("Memory Status: {}", memory),
        format!("Disk Status: {}", disks),
        format!("Network Status: {}", network),
        format!("Uptime: {}", probes::uptime()),
    ]
    .join("\n\n"))
}

#[tool(description = "Perform basic security assessment")]
pub async fn security_scan(_args: NoArgs) -> Result<String, String> {
    let (services, logs) = tokio::join!(probes::security_services(), probes::security_logs());
    Ok([
        format!("Security Services: {}", services),
        format!("Open Ports: {}", probes::open_ports()),
        format!("Recent Security Events: {}", logs),
    ]
    .join("\n\n"))
}
