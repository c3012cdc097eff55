//! Tool registry — immutable-after-startup index of registered tools.
//!
//! The registry is assembled once at process start (explicit registration
//! list in the binary) and then shared read-only behind an `Arc`. Duplicate
//! names are a configuration error, not a runtime condition.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{RegistryError, ToolError};

/// Describes a tool's name and accepted parameters for capability discovery.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name (registry key).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema of the accepted arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Trait implemented by every invokable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The tool's descriptor (name, description, argument schema).
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with the given arguments.
    async fn call(&self, arguments: Option<Value>) -> Result<Value, ToolError>;
}

/// Registry mapping tool names to handlers, preserving insertion order.
pub struct ToolRegistry {
    index: HashMap<String, usize>,
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            tools: Vec::new(),
        }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let name = tool.descriptor().name;
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        debug!(tool_name = name, "tool registered");
        let _ = self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// Whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// All tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.descriptor().name).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
