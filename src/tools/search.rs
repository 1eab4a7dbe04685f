//! Knowledge lookups: the local snapshot index and the external search placeholder

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use sysadmin_tool_macros::tool;

use super::ToolContext;
use crate::llm::{collect_text, GenerateRequest};

const RAG_RESULTS: usize = 5;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryArgs {
    /// What to look up, phrased as a question or keywords
    pub query: String,
}

#[tool(description = "Query the local system information database for relevant information")]
pub async fn rag_query(ctx: Arc<ToolContext>, args: QueryArgs) -> Result<String, String> {
    let hits = ctx
        .vector_store
        .query_similar(&args.query, RAG_RESULTS)
        .await
        .map_err(|e| format!("Error querying system information: {}", e))?;

    if hits.is_empty() {
        return Ok("No relevant system information found for your query.".to_string());
    }

    let context = hits
        .iter()
        .map(|hit| hit.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let request = GenerateRequest::prompt(
        rag_prompt(&args.query, &context),
        ctx.settings.generation_config(),
    );

    collect_text(ctx.provider.as_ref(), request)
        .await
        .map_err(|e| format!("Error querying system information: {}", e))
}

fn rag_prompt(query: &str, context: &str) -> String {
    format!(
        "Based on the following system information, answer the user's query: \"{query}\"\n\n\
         System Information:\n{context}\n\n\
         Please provide a helpful and accurate response based on the system data provided.\n\
         Include specific metrics, timestamps, and actionable recommendations when available."
    )
}

#[tool(description = "Search for IT knowledge and solutions online")]
pub fn external_search(args: QueryArgs) -> Result<String, String> {
    let query = args.query;
    Ok(format!(
        "External search results for: \"{query}\"\n\n\
         Recommended resources:\n\
         1. Official Documentation: Check vendor documentation for {query}\n\
         2. Community Forums: Search Stack Overflow, Reddit r/sysadmin\n\
         3. Knowledge Bases: Microsoft Docs, Red Hat Documentation, Ubuntu Wiki\n\
         4. Security Advisories: CVE databases, vendor security bulletins\n\n\
         Suggested search terms: {query}, troubleshooting, best practices, configuration\n\n\
         Note: live web search is not connected. Use the resources above to continue."
    ))
}
