//! Function registry for tool execution

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::executor::ToolExecutor;
use crate::llm::core::types::ToolDeclaration;

/// Type alias for shared async tool functions
pub type AsyncToolFn =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, String>> + Send + Sync>;

/// Errors raised while building a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A tool with the same name is already registered
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// Everything needed to register one tool, as produced by `#[tool]`
#[derive(Clone)]
pub struct ToolRegistration {
    /// Tool name exposed to the model
    pub name: &'static str,
    /// Type-erased executor
    pub function: AsyncToolFn,
    /// Declaration sent with each request
    pub declaration: ToolDeclaration,
}

impl std::fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct RegisteredTool {
    function: AsyncToolFn,
    declaration: Option<ToolDeclaration>,
}

/// Registry for managing tool functions
///
/// Tools are callable by name and carry the declaration the model sees. The registry
/// handles JSON decoding of arguments and encoding of results. Registration order is
/// preserved in [`declarations`](Self::declarations).
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct PortArgs {
///     port: u16,
/// }
///
/// async fn check_port(args: PortArgs) -> Result<bool, String> {
///     Ok(args.port < 1024)
/// }
///
/// let mut registry = FunctionRegistry::new();
/// registry.register_async("check_port", check_port);
/// ```
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl FunctionRegistry {
    /// Create a new empty function registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool produced by the `#[tool]` macro
    pub fn register(&mut self, registration: ToolRegistration) -> Result<(), RegistryError> {
        if self.functions.contains_key(registration.name) {
            return Err(RegistryError::DuplicateTool(registration.name.to_string()));
        }
        self.insert(
            registration.name.to_string(),
            registration.function,
            Some(registration.declaration),
        );
        Ok(())
    }

    /// Register an async function together with its declaration
    pub fn register_async_tool<F, Args, R, Fut>(
        &mut self,
        name: &str,
        func: F,
        declaration: ToolDeclaration,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        if self.functions.contains_key(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }
        self.insert(name.to_string(), wrap_async(func), Some(declaration));
        Ok(())
    }

    /// Register an async function that returns a serializable result
    ///
    /// Functions registered this way have no declaration; the model only learns about
    /// them if the caller declares them separately.
    pub fn register_async<F, Args, R, Fut>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        self.insert(name.into(), wrap_async(func), None);
    }

    /// Register a synchronous function that returns a serializable result
    pub fn register_sync<F, Args, R>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let result = serde_json::from_value::<Args>(args_json)
                .map_err(|e| format!("Failed to deserialize arguments: {}", e))
                .and_then(|args| func(args))
                .and_then(|value| encode_result(&value));
            Box::pin(async move { result }) as BoxFuture<'static, _>
        };

        self.insert(name.into(), Arc::new(wrapper), None);
    }

    fn insert(&mut self, name: String, function: AsyncToolFn, declaration: Option<ToolDeclaration>) {
        if self
            .functions
            .insert(
                name.clone(),
                RegisteredTool {
                    function,
                    declaration,
                },
            )
            .is_none()
        {
            self.order.push(name);
        }
    }

    /// Declarations of every declared tool, in registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.functions.get(name))
            .filter_map(|tool| tool.declaration.clone())
            .collect()
    }

    /// Registered tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// A registry containing only the named tools
    ///
    /// Unknown names are skipped; the result keeps this registry's ordering.
    pub fn filtered(&self, names: &[&str]) -> FunctionRegistry {
        let mut subset = FunctionRegistry::new();
        for name in &self.order {
            if names.contains(&name.as_str()) {
                if let Some(tool) = self.functions.get(name) {
                    subset.insert(name.clone(), tool.function.clone(), tool.declaration.clone());
                }
            }
        }
        subset
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    async fn execute_function(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        match self.functions.get(name) {
            Some(tool) => (tool.function)(arguments).await,
            None => Err(format!("Unknown tool: {}", name)),
        }
    }
}

/// Encode a tool result for the model
///
/// Strings are passed through as-is, anything else becomes compact JSON.
pub fn encode_result<R: Serialize + ?Sized>(result: &R) -> Result<String, String> {
    match serde_json::to_value(result) {
        Ok(serde_json::Value::String(text)) => Ok(text),
        Ok(value) => Ok(value.to_string()),
        Err(e) => Err(format!("Failed to serialize result: {}", e)),
    }
}

fn wrap_async<F, Args, R, Fut>(func: F) -> AsyncToolFn
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Args: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, String>> + Send + 'static,
{
    Arc::new(move |args_json: serde_json::Value| {
        let args = match serde_json::from_value::<Args>(args_json) {
            Ok(args) => args,
            Err(e) => {
                let err_msg = format!("Failed to deserialize arguments: {}", e);
                return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
            }
        };

        let future = func(args);

        Box::pin(async move {
            future.await.and_then(|result| encode_result(&result))
        }) as BoxFuture<'static, _>
    })
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[async_trait]
impl ToolExecutor for FunctionRegistry {
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        tracing::debug!(%tool_use_id, tool = %name, "Executing tool");
        self.execute_function(&name, arguments).await
    }
}
