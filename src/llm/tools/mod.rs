//! Tool execution framework
//!
//! The `ToolExecutor` trait is what the agent loop calls; `FunctionRegistry` is the
//! standard implementation, holding type-erased functions plus the declarations the
//! model is shown.

pub mod declaration;
pub mod executor;
pub mod registry;

pub use declaration::create_tool_declaration;
pub use executor::ToolExecutor;
pub use registry::{encode_result, AsyncToolFn, FunctionRegistry, RegistryError, ToolRegistration};

/// Register several `#[tool]` functions that take no shared state
///
/// ```ignore
/// let mut registry = FunctionRegistry::new();
/// register_tools!(registry, external_search_tool, security_scan_tool);
/// ```
#[macro_export]
macro_rules! register_tools {
    ($registry:expr, $($tool_mod:path),+ $(,)?) => {
        $(
            {
                use $tool_mod as tool;
                $registry.register(tool::registration())?;
            }
        )+
    };
}
