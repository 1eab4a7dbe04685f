//! Guarded execution of system-modifying commands

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use sysadmin_tool_macros::tool;

use super::{is_affirmative, ToolContext};
use crate::system::run_command;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SystemActionArgs {
    /// Shell command to run
    pub command: String,
}

#[tool(
    description = "Execute system-level commands that modify the system (requires user confirmation)"
)]
pub async fn system_action(ctx: Arc<ToolContext>, args: SystemActionArgs) -> Result<String, String> {
    let command = args.command;

    if !ctx.settings.require_confirmation {
        let output = run_command(&command).await;
        return Ok(if output.success {
            format!("Command executed: {}", output.stdout)
        } else {
            format!("Command failed: {}", output.stderr)
        });
    }

    let reply = ctx.confirmer.ask(&command).await;
    if !is_affirmative(&reply) {
        tracing::info!(%command, "System action declined");
        return Ok("System action cancelled by user.".to_string());
    }

    tracing::info!(%command, "Running confirmed system action");
    let output = run_command(&command).await;
    Ok(if output.success {
        format!("Command executed successfully:\n{}", output.stdout)
    } else {
        format!("Command failed:\n{}", output.stderr)
    })
}
