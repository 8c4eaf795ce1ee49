//! Terraform Provider Implementation
//!
//! Implements the Terraform Plugin Protocol for Chaos Mesh.

use crate::client::{ConnectionOptions, KubeClient, KubernetesClient};
use crate::data_sources::{get_all_data_sources, DataSource};
use crate::resources::{get_all_resources, Resource, ResourceState};
use crate::schema::{
    has_errors, Diagnostic, ProviderSchema, RpcRequest, RpcResponse, SchemaAttribute, SchemaBlock,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::runtime::Runtime;

pub const DEFAULT_FIELD_MANAGER: &str = "terraform-provider-chaosmesh";

/// Provider configuration
///
/// Terraform sends `null` for unset attributes, hence the options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub field_manager: Option<String>,
    pub force_conflicts: Option<bool>,
    pub offline: Option<bool>,
}

impl ProviderConfig {
    pub fn field_manager(&self) -> &str {
        self.field_manager
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_FIELD_MANAGER)
    }

    pub fn offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }
}

/// Handed to every resource before it runs an operation
#[derive(Clone)]
pub struct ProviderData {
    /// Unset in offline mode
    pub client: Option<Arc<dyn KubernetesClient>>,
    pub offline: bool,
    pub field_manager: String,
    pub force_conflicts: bool,
}

/// Chaos Mesh Terraform Provider
pub struct ChaosMeshProvider {
    data: RwLock<Option<ProviderData>>,
    resources: BTreeMap<String, Box<dyn Resource>>,
    data_sources: BTreeMap<String, Box<dyn DataSource>>,
    runtime: Runtime,
}

impl ChaosMeshProvider {
    /// Create a new provider
    pub fn new() -> anyhow::Result<Self> {
        let resources = get_all_resources()
            .into_iter()
            .map(|r| (r.type_name().to_string(), r))
            .collect();
        let data_sources = get_all_data_sources()
            .into_iter()
            .map(|d| (d.type_name().to_string(), d))
            .collect();

        let runtime = Runtime::new().context("Failed to create Tokio runtime")?;

        Ok(Self {
            data: RwLock::new(None),
            resources,
            data_sources,
            runtime,
        })
    }

    /// Get provider schema
    fn get_schema(&self) -> ProviderSchema {
        let provider_block = SchemaBlock::new()
            .with_attribute(
                "kubeconfig",
                SchemaAttribute::string()
                    .with_description(
                        "Path to a kubeconfig file. Falls back to KUBECONFIG, ~/.kube/config \
                         and the in-cluster configuration when unset.",
                    )
                    .optional(),
            )
            .with_attribute(
                "context",
                SchemaAttribute::string()
                    .with_description("Context to use from the kubeconfig")
                    .optional(),
            )
            .with_attribute(
                "field_manager",
                SchemaAttribute::string()
                    .with_description("Field manager recorded by server-side apply")
                    .optional()
                    .with_default(json!(DEFAULT_FIELD_MANAGER)),
            )
            .with_attribute(
                "force_conflicts",
                SchemaAttribute::bool()
                    .with_description("Take ownership of fields managed by someone else")
                    .optional()
                    .with_default(json!(false)),
            )
            .with_attribute(
                "offline",
                SchemaAttribute::bool()
                    .with_description("Never contact the cluster; only data sources are usable")
                    .optional()
                    .with_default(json!(false)),
            )
            .with_description("Chaos Mesh provider for Kubernetes");

        let mut schema = ProviderSchema::new(provider_block);
        for (name, resource) in &self.resources {
            schema = schema.with_resource(name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(name, data_source.schema());
        }
        schema
    }

    /// Configure the provider
    fn configure(&self, config: ProviderConfig) -> Vec<Diagnostic> {
        let client: Option<Arc<dyn KubernetesClient>> = if config.offline() {
            tracing::info!("Provider configured in offline mode");
            None
        } else {
            let options = ConnectionOptions {
                kubeconfig: config.kubeconfig.clone(),
                context: config.context.clone(),
            };
            match self.runtime.block_on(KubeClient::connect(&options)) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::error!(error = %e, "Unable to create Kubernetes client");
                    return vec![Diagnostic::error("Unable to create Kubernetes client")
                        .with_detail(&e.to_string())];
                }
            }
        };

        self.store(ProviderData {
            client,
            offline: config.offline(),
            field_manager: config.field_manager().to_string(),
            force_conflicts: config.force_conflicts.unwrap_or(false),
        })
    }

    fn store(&self, data: ProviderData) -> Vec<Diagnostic> {
        match self.data.write() {
            Ok(mut guard) => {
                *guard = Some(data);
                Vec::new()
            }
            Err(_) => vec![Diagnostic::error("Provider data is unavailable")],
        }
    }

    /// Hand the current provider data to a resource
    fn configure_resource(&self, resource: &dyn Resource) -> Vec<Diagnostic> {
        match self.data.read() {
            Ok(guard) => resource.configure(guard.as_ref()),
            Err(_) => vec![Diagnostic::error("Provider data is unavailable")],
        }
    }

    fn resource(&self, id: i64, params: &Value) -> Result<&dyn Resource, RpcResponse> {
        let type_name = type_name(params);
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| {
                RpcResponse::diagnostics(
                    id,
                    vec![Diagnostic::error(&format!("Unknown resource type: {}", type_name))],
                )
            })
    }

    fn data_source(&self, id: i64, params: &Value) -> Result<&dyn DataSource, RpcResponse> {
        let type_name = type_name(params);
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                RpcResponse::diagnostics(
                    id,
                    vec![Diagnostic::error(&format!("Unknown data source type: {}", type_name))],
                )
            })
    }

    /// Handle an RPC request
    pub fn handle_request(&self, input: &str) -> String {
        let request: RpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                return serde_json::to_string(&RpcResponse::error(
                    0,
                    -32700,
                    &format!("Parse error: {}", e),
                ))
                .unwrap_or_default();
            }
        };

        tracing::debug!(method = %request.method, id = request.id, "Handling request");
        let id = request.id;
        let params = &request.params;

        let response = match request.method.as_str() {
            "GetProviderSchema" => self.handle_get_schema(id),
            "ConfigureProvider" => self.handle_configure(id, params),
            "ValidateResourceConfig" => self.handle_validate_resource(id, params),
            "ValidateDataResourceConfig" => self.handle_validate_data_source(id, params),
            "PlanResourceChange" => self.handle_plan_resource(id, params),
            "ApplyResourceChange" => self.handle_apply_resource(id, params),
            "ReadResource" => self.handle_read_resource(id, params),
            "ImportResourceState" => self.handle_import_resource(id, params),
            "ReadDataSource" => self.handle_read_data_source(id, params),
            "StopProvider" => RpcResponse::success(id, json!({})),
            _ => RpcResponse::error(id, -32601, &format!("Method not found: {}", request.method)),
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            serde_json::to_string(&RpcResponse::error(
                id,
                -32603,
                &format!("Serialization error: {}", e),
            ))
            .unwrap_or_default()
        })
    }

    /// Handle GetProviderSchema
    fn handle_get_schema(&self, id: i64) -> RpcResponse {
        match serde_json::to_value(self.get_schema()) {
            Ok(schema) => RpcResponse::success(id, schema),
            Err(e) => RpcResponse::error(id, -32603, &format!("Serialization error: {}", e)),
        }
    }

    /// Handle ConfigureProvider
    fn handle_configure(&self, id: i64, params: &Value) -> RpcResponse {
        let config = match params.get("config") {
            None | Some(Value::Null) => ProviderConfig::default(),
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(config) => config,
                Err(e) => {
                    return RpcResponse::diagnostics(
                        id,
                        vec![Diagnostic::error("Invalid provider configuration")
                            .with_detail(&e.to_string())],
                    );
                }
            },
        };

        RpcResponse::diagnostics(id, self.configure(config))
    }

    /// Handle ValidateResourceConfig
    fn handle_validate_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };
        let config = state_param(params, "config").unwrap_or_default();
        RpcResponse::diagnostics(id, resource.validate(&config))
    }

    /// Handle ValidateDataResourceConfig
    fn handle_validate_data_source(&self, id: i64, params: &Value) -> RpcResponse {
        let data_source = match self.data_source(id, params) {
            Ok(d) => d,
            Err(response) => return response,
        };
        let config = state_param(params, "config").unwrap_or_default();
        RpcResponse::diagnostics(id, data_source.validate(&config))
    }

    /// Handle PlanResourceChange
    fn handle_plan_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        // Destroy plans carry no proposed state
        let Some(proposed) = state_param(params, "proposed_new_state") else {
            return RpcResponse::success(id, json!({"planned_state": null, "diagnostics": []}));
        };
        let prior = state_param(params, "prior_state");

        match resource.plan_change(prior.as_ref(), &proposed) {
            Ok(planned) => RpcResponse::success(
                id,
                json!({
                    "planned_state": planned.state.values,
                    "requires_replace": planned.requires_replace,
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, diagnostics),
        }
    }

    /// Handle ApplyResourceChange
    fn handle_apply_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let diagnostics = self.configure_resource(resource);
        if has_errors(&diagnostics) {
            return RpcResponse::diagnostics(id, diagnostics);
        }

        let planned = state_param(params, "planned_state");
        let prior = state_param(params, "prior_state");

        let result = self.runtime.block_on(async {
            match (prior, planned) {
                (Some(prior), None) => resource.delete(&prior).await.map(|_| None),
                (None, Some(planned)) => resource.create(&planned).await.map(Some),
                (Some(prior), Some(planned)) => resource.update(&prior, &planned).await.map(Some),
                (None, None) => Ok(None),
            }
        });

        match result {
            Ok(new_state) => RpcResponse::success(
                id,
                json!({
                    "new_state": new_state.map(|s| s.values),
                    "diagnostics": diagnostics
                }),
            ),
            Err(errors) => RpcResponse::diagnostics(id, errors),
        }
    }

    /// Handle ReadResource
    fn handle_read_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let diagnostics = self.configure_resource(resource);
        if has_errors(&diagnostics) {
            return RpcResponse::diagnostics(id, diagnostics);
        }

        let current = state_param(params, "current_state").unwrap_or_default();
        match self.runtime.block_on(resource.read(&current)) {
            Ok(state) => RpcResponse::success(
                id,
                json!({
                    "new_state": state.values,
                    "diagnostics": diagnostics
                }),
            ),
            Err(errors) => RpcResponse::diagnostics(id, errors),
        }
    }

    /// Handle ImportResourceState
    fn handle_import_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let resource = match self.resource(id, params) {
            Ok(r) => r,
            Err(response) => return response,
        };

        let diagnostics = self.configure_resource(resource);
        if has_errors(&diagnostics) {
            return RpcResponse::diagnostics(id, diagnostics);
        }

        let import_id = params.get("id").and_then(Value::as_str).unwrap_or("");
        match resource.import_state(import_id) {
            Ok(state) => RpcResponse::success(
                id,
                json!({
                    "imported_resources": [{
                        "type_name": resource.type_name(),
                        "state": state.values
                    }],
                    "diagnostics": diagnostics
                }),
            ),
            Err(errors) => RpcResponse::diagnostics(id, errors),
        }
    }

    /// Handle ReadDataSource
    fn handle_read_data_source(&self, id: i64, params: &Value) -> RpcResponse {
        let data_source = match self.data_source(id, params) {
            Ok(d) => d,
            Err(response) => return response,
        };

        let config = state_param(params, "config").unwrap_or_default();
        match data_source.read(&config) {
            Ok(state) => RpcResponse::success(
                id,
                json!({
                    "state": state.values,
                    "diagnostics": []
                }),
            ),
            Err(errors) => RpcResponse::diagnostics(id, errors),
        }
    }
}

fn type_name(params: &Value) -> &str {
    params.get("type_name").and_then(Value::as_str).unwrap_or("")
}

/// Object-valued parameter as state, `None` when absent or null
fn state_param(params: &Value, key: &str) -> Option<ResourceState> {
    params.get(key).and_then(ResourceState::from_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Result as ClientResult;
    use async_trait::async_trait;
    use kube::api::{ApiResource, DynamicObject, PatchParams};
    use pretty_assertions::assert_eq;

    /// Answers apply with the submitted object and get with "not found"
    struct EchoClient;

    #[async_trait]
    impl KubernetesClient for EchoClient {
        async fn apply(
            &self,
            _resource: &ApiResource,
            _namespace: &str,
            _name: &str,
            object: &DynamicObject,
            _params: &PatchParams,
        ) -> ClientResult<DynamicObject> {
            Ok(object.clone())
        }

        async fn get(&self, _resource: &ApiResource, _namespace: &str, _name: &str) -> ClientResult<DynamicObject> {
            Err(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: "workflows.chaos-mesh.org not found".to_string(),
                reason: "NotFound".to_string(),
                code: 404,
            })
            .into())
        }

        async fn delete(&self, _resource: &ApiResource, _namespace: &str, _name: &str) -> ClientResult<()> {
            Ok(())
        }
    }

    fn online_provider() -> ChaosMeshProvider {
        let provider = ChaosMeshProvider::new().unwrap();
        let diags = provider.store(ProviderData {
            client: Some(Arc::new(EchoClient)),
            offline: false,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
        });
        assert!(diags.is_empty());
        provider
    }

    fn call(provider: &ChaosMeshProvider, method: &str, params: Value) -> Value {
        let request = json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": params});
        serde_json::from_str(&provider.handle_request(&request.to_string())).unwrap()
    }

    fn workflow_config() -> Value {
        json!({
            "id": null,
            "api_version": null,
            "kind": null,
            "metadata": {"name": "pod-kill", "namespace": "chaos", "labels": null, "annotations": null},
            "spec": {
                "entry": "kill",
                "templates": [{
                    "name": "kill",
                    "template_type": "PodChaos",
                    "deadline": "1m",
                    "pod_chaos": {"action": "pod-kill", "mode": "one", "selector": {"namespaces": ["web"]}}
                }]
            }
        })
    }

    fn summaries(response: &Value) -> Vec<String> {
        response["result"]["diagnostics"]
            .as_array()
            .map(|diags| {
                diags
                    .iter()
                    .filter_map(|d| d["summary"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_provider_schema() {
        let provider = ChaosMeshProvider::new().unwrap();
        let schema = provider.get_schema();

        for attr in ["kubeconfig", "context", "field_manager", "force_conflicts", "offline"] {
            assert!(schema.provider.attributes.contains_key(attr), "{}", attr);
        }
        assert!(schema.resource_schemas.contains_key("chaosmesh_workflow_v1alpha1"));
        assert!(schema
            .data_source_schemas
            .contains_key("chaosmesh_workflow_v1alpha1_manifest"));
    }

    #[test]
    fn test_provider_config_defaults() {
        let config: ProviderConfig =
            serde_json::from_value(json!({"kubeconfig": null, "field_manager": null})).unwrap();
        assert_eq!(config.field_manager(), DEFAULT_FIELD_MANAGER);
        assert!(!config.offline());

        let config: ProviderConfig =
            serde_json::from_value(json!({"field_manager": "ops", "offline": true})).unwrap();
        assert_eq!(config.field_manager(), "ops");
        assert!(config.offline());
    }

    #[test]
    fn test_handle_get_schema() {
        let provider = ChaosMeshProvider::new().unwrap();
        let response = call(&provider, "GetProviderSchema", json!({}));

        assert!(response["result"]["provider"].is_object());
        assert!(response["result"]["resource_schemas"]["chaosmesh_workflow_v1alpha1"].is_object());
    }

    #[test]
    fn test_handle_unknown_method() {
        let provider = ChaosMeshProvider::new().unwrap();
        let response = call(&provider, "UnknownMethod", json!({}));

        assert_eq!(response["error"]["code"], json!(-32601));
        assert_eq!(response["id"], json!(7));
    }

    #[test]
    fn test_handle_parse_error() {
        let provider = ChaosMeshProvider::new().unwrap();
        let response: Value = serde_json::from_str(&provider.handle_request("{not json")).unwrap();

        assert_eq!(response["error"]["code"], json!(-32700));
    }

    #[test]
    fn test_offline_provider_rejects_resource_operations() {
        let provider = ChaosMeshProvider::new().unwrap();
        let response = call(&provider, "ConfigureProvider", json!({"config": {"offline": true}}));
        assert_eq!(summaries(&response), Vec::<String>::new());

        let response = call(
            &provider,
            "ApplyResourceChange",
            json!({
                "type_name": "chaosmesh_workflow_v1alpha1",
                "prior_state": null,
                "planned_state": workflow_config()
            }),
        );

        assert_eq!(summaries(&response), vec!["Provider in Offline Mode".to_string()]);
        assert!(response["result"].get("new_state").is_none());
    }

    #[test]
    fn test_offline_provider_reads_data_source() {
        let provider = ChaosMeshProvider::new().unwrap();
        call(&provider, "ConfigureProvider", json!({"config": {"offline": true}}));

        let mut config = workflow_config();
        let fields = config.as_object_mut().unwrap();
        fields.remove("api_version");
        fields.remove("kind");
        let response = call(
            &provider,
            "ReadDataSource",
            json!({"type_name": "chaosmesh_workflow_v1alpha1_manifest", "config": config}),
        );

        assert_eq!(response["result"]["state"]["id"], json!("pod-kill/chaos"));
        let yaml = response["result"]["state"]["yaml"].as_str().unwrap();
        assert!(yaml.contains("kind: Workflow"));
        assert!(yaml.contains("podChaos:"));
    }

    #[test]
    fn test_unconfigured_provider_reports_error() {
        let provider = ChaosMeshProvider::new().unwrap();
        let response = call(
            &provider,
            "ApplyResourceChange",
            json!({
                "type_name": "chaosmesh_workflow_v1alpha1",
                "planned_state": workflow_config()
            }),
        );

        assert_eq!(summaries(&response), vec!["Provider not configured".to_string()]);
    }

    #[test]
    fn test_apply_create() {
        let provider = online_provider();
        let response = call(
            &provider,
            "ApplyResourceChange",
            json!({
                "type_name": "chaosmesh_workflow_v1alpha1",
                "prior_state": null,
                "planned_state": workflow_config()
            }),
        );

        let state = &response["result"]["new_state"];
        assert_eq!(state["id"], json!("pod-kill/chaos"));
        assert_eq!(state["kind"], json!("Workflow"));
        assert_eq!(
            state["spec"]["templates"][0]["pod_chaos"]["action"],
            json!("pod-kill")
        );
    }

    #[test]
    fn test_apply_destroy() {
        let provider = online_provider();
        let response = call(
            &provider,
            "ApplyResourceChange",
            json!({
                "type_name": "chaosmesh_workflow_v1alpha1",
                "prior_state": workflow_config(),
                "planned_state": null
            }),
        );

        assert_eq!(response["result"]["new_state"], Value::Null);
        assert_eq!(summaries(&response), Vec::<String>::new());
    }

    #[test]
    fn test_read_missing_object_reports_error() {
        let provider = online_provider();
        let response = call(
            &provider,
            "ReadResource",
            json!({"type_name": "chaosmesh_workflow_v1alpha1", "current_state": workflow_config()}),
        );

        assert_eq!(summaries(&response), vec!["Unable to GET resource".to_string()]);
    }

    #[test]
    fn test_import() {
        let provider = online_provider();
        let response = call(
            &provider,
            "ImportResourceState",
            json!({"type_name": "chaosmesh_workflow_v1alpha1", "id": "chaos/pod-kill"}),
        );

        let imported = &response["result"]["imported_resources"][0];
        assert_eq!(imported["type_name"], json!("chaosmesh_workflow_v1alpha1"));
        assert_eq!(imported["state"]["metadata"]["namespace"], json!("chaos"));
        assert_eq!(imported["state"]["metadata"]["name"], json!("pod-kill"));

        let response = call(
            &provider,
            "ImportResourceState",
            json!({"type_name": "chaosmesh_workflow_v1alpha1", "id": "pod-kill"}),
        );
        assert_eq!(summaries(&response), vec!["Error importing resource".to_string()]);
    }

    #[test]
    fn test_plan_requires_replace() {
        let provider = ChaosMeshProvider::new().unwrap();
        let mut prior = workflow_config();
        prior["id"] = json!("pod-kill/chaos");
        let mut proposed = workflow_config();
        proposed["metadata"]["name"] = json!("pod-kill-2");

        let response = call(
            &provider,
            "PlanResourceChange",
            json!({
                "type_name": "chaosmesh_workflow_v1alpha1",
                "prior_state": prior,
                "proposed_new_state": proposed
            }),
        );

        assert_eq!(response["result"]["requires_replace"], json!([["metadata", "name"]]));
        assert_eq!(response["result"]["planned_state"]["id"], json!("pod-kill/chaos"));
    }

    #[test]
    fn test_validate_resource_config() {
        let provider = ChaosMeshProvider::new().unwrap();
        let mut config = workflow_config();
        config["spec"]["templates"][0]["pod_chaos"]["mode"] = json!("some");

        let response = call(
            &provider,
            "ValidateResourceConfig",
            json!({"type_name": "chaosmesh_workflow_v1alpha1", "config": config}),
        );

        assert_eq!(summaries(&response), vec!["Invalid Attribute Value".to_string()]);
    }

    #[test]
    fn test_unknown_resource_type() {
        let provider = ChaosMeshProvider::new().unwrap();
        let response = call(
            &provider,
            "ReadResource",
            json!({"type_name": "chaosmesh_schedule_v1alpha1", "current_state": {}}),
        );

        assert_eq!(
            summaries(&response),
            vec!["Unknown resource type: chaosmesh_schedule_v1alpha1".to_string()]
        );
    }
}
