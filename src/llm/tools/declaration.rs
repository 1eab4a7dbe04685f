//! Tool declaration helpers using JSON Schema generation

use schemars::{schema_for, JsonSchema};

use crate::llm::core::types::ToolDeclaration;

/// Create a tool declaration from a type that implements JsonSchema
///
/// The schema keeps schemars' full output (`$schema`, `title`, ...); the Gemini mapper
/// strips what the API does not accept.
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct LiveInfoArgs {
///     /// Command or natural-language request
///     command_or_request: String,
/// }
///
/// let decl = create_tool_declaration::<LiveInfoArgs>(
///     "live_system_info",
///     "Get live system information",
/// );
/// ```
pub fn create_tool_declaration<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDeclaration {
    let schema = schema_for!(T);
    let input_schema = serde_json::to_value(&schema).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to an empty argument schema");
        serde_json::json!({"type": "object", "properties": {}})
    });
    ToolDeclaration {
        name: name.into(),
        description: description.into(),
        input_schema,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct ScanArgs {
        /// Host to inspect
        host: String,
        /// Maximum number of findings
        limit: u32,
    }

    #[test]
    fn test_create_tool_declaration() {
        let decl = create_tool_declaration::<ScanArgs>("scan", "Scan a host");

        assert_eq!(decl.name, "scan");
        assert_eq!(decl.description, "Scan a host");

        let schema_obj = decl.input_schema.as_object().unwrap();
        assert!(schema_obj.contains_key("type"));
        assert!(schema_obj.contains_key("properties"));
        assert_eq!(decl.input_schema["required"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_includes_doc_comments() {
        let decl = create_tool_declaration::<ScanArgs>("scan", "Scan a host");
        let schema_str = serde_json::to_string(&decl.input_schema).unwrap();
        assert!(schema_str.contains("Host to inspect"));
        assert!(schema_str.contains("Maximum number of findings"));
    }
}
