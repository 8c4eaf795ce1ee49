//! Terraform Resources for Chaos Mesh
//!
//! Defines the resources that can be managed via Terraform.

mod workflow_v1alpha1;
pub mod workflow_v1alpha1_model;
pub mod workflow_v1alpha1_schema;

pub use workflow_v1alpha1::WorkflowV1Alpha1Resource;

use crate::provider::ProviderData;
use crate::schema::{AttributePath, Diagnostic, ResourceSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, Vec<Diagnostic>>;

/// Resource state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub values: Map<String, Value>,
}

impl ResourceState {
    /// Build a state from a JSON object, `None` for anything else
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|values| Self {
            values: values.clone(),
        })
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String at a nested path such as `["metadata", "name"]`
    pub fn get_path_string(&self, path: &[&str]) -> Option<String> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.values.get(*first)?, |value, key| value.get(*key))
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(|v| v.as_str()).map(String::from)
    }
}

/// Outcome of planning a change
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub state: ResourceState,
    pub requires_replace: Vec<AttributePath>,
}

/// Resource trait
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name
    fn type_name(&self) -> &str;

    /// Get the schema for this resource
    fn schema(&self) -> ResourceSchema;

    /// Receive provider data before any other operation runs
    fn configure(&self, provider_data: Option<&ProviderData>) -> Vec<Diagnostic>;

    /// Create a new resource
    async fn create(&self, planned: &ResourceState) -> ResourceResult<ResourceState>;

    /// Read an existing resource
    async fn read(&self, current: &ResourceState) -> ResourceResult<ResourceState>;

    /// Update an existing resource
    async fn update(
        &self,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState>;

    /// Delete a resource
    async fn delete(&self, current: &ResourceState) -> ResourceResult<()>;

    /// Seed state from an import identifier
    fn import_state(&self, id: &str) -> ResourceResult<ResourceState>;

    /// Validate a configuration against the schema
    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        self.schema().block.validate(&config.to_value())
    }

    /// Plan changes by applying the schema's plan modifiers
    fn plan_change(
        &self,
        current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<PlannedChange> {
        let prior = current.map(ResourceState::to_value).unwrap_or(Value::Null);
        let (planned, requires_replace) = self.schema().block.plan(&prior, &proposed.to_value());
        Ok(PlannedChange {
            state: ResourceState::from_value(&planned).unwrap_or_default(),
            requires_replace,
        })
    }
}

/// Get all available resources
pub fn get_all_resources() -> Vec<Box<dyn Resource>> {
    vec![Box::new(WorkflowV1Alpha1Resource::new())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_state() {
        let mut state = ResourceState::new();
        state.set("id", json!("wf/chaos"));
        state.set("metadata", json!({"name": "wf", "namespace": "chaos"}));

        assert_eq!(state.get_string("id"), Some("wf/chaos".to_string()));
        assert_eq!(
            state.get_path_string(&["metadata", "namespace"]),
            Some("chaos".to_string())
        );
        assert_eq!(state.get_path_string(&["metadata", "labels"]), None);
        assert_eq!(state.get_path_string(&[]), None);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(ResourceState::from_value(&json!(null)).is_none());
        assert!(ResourceState::from_value(&json!([1, 2])).is_none());
        assert!(ResourceState::from_value(&json!({})).is_some_and(|s| s.values.is_empty()));
    }

    #[test]
    fn test_registry() {
        let resources = get_all_resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].type_name(), "chaosmesh_workflow_v1alpha1");
    }
}
