//! `chaosmesh_workflow_v1alpha1` resource
//!
//! Plan values are encoded to a `Workflow` object and server-side applied;
//! whatever the API server answers becomes the new `metadata` and `spec`.

use super::workflow_v1alpha1_model::{self as model, Workflow};
use super::workflow_v1alpha1_schema::{metadata_attribute, spec_attribute};
use super::{Resource, ResourceResult, ResourceState};
use crate::client::{apply_params, KubernetesClient};
use crate::provider::ProviderData;
use crate::schema::{Diagnostic, PlanModifier, ResourceSchema, SchemaAttribute, SchemaBlock};
use async_trait::async_trait;
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};

const TYPE_NAME: &str = "chaosmesh_workflow_v1alpha1";

#[derive(Clone)]
struct Configured {
    client: Arc<dyn KubernetesClient>,
    field_manager: String,
    force_conflicts: bool,
}

pub struct WorkflowV1Alpha1Resource {
    configured: RwLock<Option<Configured>>,
}

impl WorkflowV1Alpha1Resource {
    pub fn new() -> Self {
        Self {
            configured: RwLock::new(None),
        }
    }

    fn configured(&self) -> ResourceResult<Configured> {
        self.configured
            .read()
            .map_err(|_| vec![Diagnostic::error("Resource configuration is unavailable")])?
            .clone()
            .ok_or_else(|| {
                vec![Diagnostic::error("Provider not configured").with_detail(
                    "The provider must be configured before this resource can be managed.",
                )]
            })
    }
}

impl Default for WorkflowV1Alpha1Resource {
    fn default() -> Self {
        Self::new()
    }
}

/// Attributes of the resource
pub fn resource_block() -> SchemaBlock {
    SchemaBlock::new()
        .with_attribute(
            "id",
            SchemaAttribute::string()
                .with_description("Identifier of this resource in the form 'name/namespace'.")
                .computed()
                .state_only()
                .with_plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .with_attribute(
            "api_version",
            SchemaAttribute::string()
                .with_description("The API group and version of the resource.")
                .computed()
                .with_plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .with_attribute(
            "kind",
            SchemaAttribute::string()
                .with_description("The kind of the resource.")
                .computed()
                .with_plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .with_attribute("metadata", metadata_attribute())
        .with_attribute("spec", spec_attribute())
        .with_description("Workflow is the Schema for the workflows API")
}

/// `(name, namespace)` from `metadata`
fn object_key(state: &ResourceState) -> ResourceResult<(String, String)> {
    let name = state.get_path_string(&["metadata", "name"]);
    let namespace = state.get_path_string(&["metadata", "namespace"]);
    match (name, namespace) {
        (Some(name), Some(namespace)) => Ok((name, namespace)),
        _ => Err(vec![Diagnostic::error("Missing object key").with_detail(
            "Both metadata.name and metadata.namespace must be set.",
        )]),
    }
}

/// Encode Terraform state into the object sent to the API server
fn encode(block: &SchemaBlock, state: &ResourceState) -> Result<DynamicObject, serde_json::Error> {
    let workflow: Workflow = serde_json::from_value(block.to_api_object(&state.to_value()))?;
    serde_json::from_value(serde_json::to_value(&workflow)?)
}

fn decode(object: &DynamicObject) -> ResourceResult<Workflow> {
    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|e| {
            tracing::error!(error = %e, "Unable to unmarshal {}", TYPE_NAME);
            vec![Diagnostic::error("Unable to unmarshal resource").with_detail(&format!(
                "An unexpected error occurred while parsing the resource read response. \
                 Please report this issue to the provider developers.\n\nJSON Error: {}",
                e
            ))]
        })
}

/// Overwrite `metadata` and `spec` with what the API server holds
fn store_response(
    block: &SchemaBlock,
    state: &mut ResourceState,
    workflow: &Workflow,
) -> ResourceResult<()> {
    let object = serde_json::to_value(workflow).map_err(|e| {
        vec![Diagnostic::error("Unable to marshal response").with_detail(&e.to_string())]
    })?;
    let projected = block.from_api_object(&object);
    for key in ["metadata", "spec"] {
        state.set(key, projected.get(key).cloned().unwrap_or(Value::Null));
    }
    Ok(())
}

impl WorkflowV1Alpha1Resource {
    /// Shared by create and update: apply `state` and store the answer
    async fn apply(&self, mut state: ResourceState, operation: &str) -> ResourceResult<ResourceState> {
        let configured = self.configured()?;
        let (name, namespace) = object_key(&state)?;
        let block = resource_block();

        state.set("api_version", json!(model::API_VERSION));
        state.set("kind", json!(model::KIND));

        let object = encode(&block, &state).map_err(|e| {
            tracing::error!(%namespace, %name, error = %e, "Unable to marshal {}", TYPE_NAME);
            vec![Diagnostic::error("Unable to marshal resource").with_detail(&format!(
                "An unexpected error occurred while creating the resource {} request. \
                 Please report this issue to the provider developers.\n\nJSON Error: {}",
                operation, e
            ))]
        })?;

        let params = apply_params(&configured.field_manager, configured.force_conflicts);
        let applied = configured
            .client
            .apply(&model::api_resource(), &namespace, &name, &object, &params)
            .await
            .map_err(|e| {
                tracing::error!(%namespace, %name, error = %e, "Unable to PATCH {}", TYPE_NAME);
                vec![Diagnostic::error("Unable to PATCH resource").with_detail(&format!(
                    "An unexpected error occurred while creating the resource patch. \
                     Please report this issue to the provider developers.\n\nPATCH Error: {}",
                    e
                ))]
            })?;

        let workflow = decode(&applied)?;
        store_response(&block, &mut state, &workflow)?;
        Ok(state)
    }
}

#[async_trait]
impl Resource for WorkflowV1Alpha1Resource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(0, resource_block())
    }

    fn configure(&self, provider_data: Option<&ProviderData>) -> Vec<Diagnostic> {
        // Called before the provider itself is configured
        let Some(data) = provider_data else {
            return Vec::new();
        };

        if data.offline {
            return vec![Diagnostic::error("Provider in Offline Mode").with_detail(
                "This resource requires the provider to be in online mode. \
                 Set 'offline' to false in the provider configuration.",
            )];
        }

        let Some(client) = data.client.clone() else {
            return vec![Diagnostic::error("Unexpected Resource Configure Type").with_detail(
                "Expected provider data carrying a Kubernetes client. \
                 Please report this issue to the provider developers.",
            )];
        };

        match self.configured.write() {
            Ok(mut guard) => {
                *guard = Some(Configured {
                    client,
                    field_manager: data.field_manager.clone(),
                    force_conflicts: data.force_conflicts,
                });
                Vec::new()
            }
            Err(_) => vec![Diagnostic::error("Resource configuration is unavailable")],
        }
    }

    async fn create(&self, planned: &ResourceState) -> ResourceResult<ResourceState> {
        let (name, namespace) = object_key(planned)?;
        tracing::debug!(%namespace, %name, "Create resource {}", TYPE_NAME);

        let mut state = planned.clone();
        state.set("id", json!(format!("{}/{}", name, namespace)));
        self.apply(state, "create").await
    }

    async fn read(&self, current: &ResourceState) -> ResourceResult<ResourceState> {
        let configured = self.configured()?;
        let (name, namespace) = object_key(current)?;
        tracing::debug!(%namespace, %name, "Read resource {}", TYPE_NAME);

        let object = configured
            .client
            .get(&model::api_resource(), &namespace, &name)
            .await
            .map_err(|e| {
                tracing::error!(%namespace, %name, error = %e, "Unable to GET {}", TYPE_NAME);
                vec![Diagnostic::error("Unable to GET resource").with_detail(&format!(
                    "An unexpected error occurred while reading the resource. \
                     Please report this issue to the provider developers.\n\nGET Error: {}",
                    e
                ))]
            })?;

        let workflow = decode(&object)?;
        let mut state = current.clone();
        store_response(&resource_block(), &mut state, &workflow)?;
        Ok(state)
    }

    async fn update(
        &self,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        let (name, namespace) = object_key(planned)?;
        tracing::debug!(%namespace, %name, "Update resource {}", TYPE_NAME);

        let mut state = planned.clone();
        if state.get("id").map_or(true, Value::is_null) {
            if let Some(id) = current.get("id") {
                state.set("id", id.clone());
            }
        }
        self.apply(state, "update").await
    }

    async fn delete(&self, current: &ResourceState) -> ResourceResult<()> {
        let configured = self.configured()?;
        let (name, namespace) = object_key(current)?;
        tracing::debug!(%namespace, %name, "Delete resource {}", TYPE_NAME);

        configured
            .client
            .delete(&model::api_resource(), &namespace, &name)
            .await
            .map_err(|e| {
                tracing::error!(%namespace, %name, error = %e, "Unable to DELETE {}", TYPE_NAME);
                vec![Diagnostic::error("Unable to DELETE resource").with_detail(&format!(
                    "An unexpected error occurred while deleting the resource. \
                     Please report this issue to the provider developers.\n\nDELETE Error: {}",
                    e
                ))]
            })
    }

    fn import_state(&self, id: &str) -> ResourceResult<ResourceState> {
        let parts: Vec<&str> = id.split('/').collect();
        let [namespace, name] = parts.as_slice() else {
            return Err(vec![import_error(id)]);
        };
        if namespace.is_empty() || name.is_empty() {
            return Err(vec![import_error(id)]);
        }
        tracing::debug!(%namespace, %name, "Import resource {}", TYPE_NAME);

        let seeded = resource_block().from_api_object(&json!({
            "metadata": {"name": name, "namespace": namespace}
        }));
        ResourceState::from_value(&seeded).ok_or_else(|| vec![import_error(id)])
    }
}

fn import_error(id: &str) -> Diagnostic {
    Diagnostic::error("Error importing resource").with_detail(&format!(
        "Expected import identifier with format: 'namespace/name' Got: '{}'",
        id
    ))
}
