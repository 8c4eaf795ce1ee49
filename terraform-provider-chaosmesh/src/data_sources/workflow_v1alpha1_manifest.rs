//! `chaosmesh_workflow_v1alpha1_manifest` data source
//!
//! Renders a Workflow as a YAML manifest, e.g. for `kubectl apply` or a
//! GitOps repository.

use super::DataSource;
use crate::resources::workflow_v1alpha1_model::{self as model, Workflow};
use crate::resources::workflow_v1alpha1_schema::{metadata_attribute, spec_attribute};
use crate::resources::{ResourceResult, ResourceState};
use crate::schema::{Diagnostic, ResourceSchema, SchemaAttribute, SchemaBlock};
use serde_json::{json, Value};

const TYPE_NAME: &str = "chaosmesh_workflow_v1alpha1_manifest";

pub struct WorkflowV1Alpha1ManifestDataSource;

fn manifest_block() -> SchemaBlock {
    SchemaBlock::new()
        .with_attribute(
            "id",
            SchemaAttribute::string()
                .with_description("Identifier of the manifest in the form 'name/namespace'.")
                .computed()
                .state_only(),
        )
        .with_attribute(
            "yaml",
            SchemaAttribute::string()
                .with_description("The Workflow rendered as a Kubernetes YAML manifest.")
                .computed()
                .state_only(),
        )
        .with_attribute("metadata", metadata_attribute())
        .with_attribute("spec", spec_attribute())
        .with_description("Renders a Chaos Mesh Workflow as YAML without contacting the cluster")
}

/// Encode `config` into the typed object
fn to_workflow(block: &SchemaBlock, config: &ResourceState) -> Result<Workflow, serde_json::Error> {
    let mut object = block.to_api_object(&config.to_value());
    if let Value::Object(fields) = &mut object {
        fields.insert("apiVersion".to_string(), json!(model::API_VERSION));
        fields.insert("kind".to_string(), json!(model::KIND));
    }
    serde_json::from_value(object)
}

impl DataSource for WorkflowV1Alpha1ManifestDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(0, manifest_block())
    }

    fn read(&self, config: &ResourceState) -> ResourceResult<ResourceState> {
        let name = config.get_path_string(&["metadata", "name"]).unwrap_or_default();
        let namespace = config.get_path_string(&["metadata", "namespace"]).unwrap_or_default();
        tracing::debug!(%namespace, %name, "Render manifest {}", TYPE_NAME);

        let workflow = to_workflow(&manifest_block(), config).map_err(|e| {
            vec![Diagnostic::error("Unable to marshal resource").with_detail(&format!(
                "An unexpected error occurred while encoding the manifest. \
                 Please report this issue to the provider developers.\n\nJSON Error: {}",
                e
            ))]
        })?;

        let yaml = serde_yaml::to_string(&workflow).map_err(|e| {
            tracing::error!(%namespace, %name, error = %e, "Unable to render {}", TYPE_NAME);
            vec![Diagnostic::error("Unable to render manifest").with_detail(&format!("YAML Error: {}", e))]
        })?;

        let mut state = config.clone();
        state.set("id", json!(format!("{}/{}", name, namespace)));
        state.set("yaml", json!(yaml));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ResourceState {
        ResourceState::from_value(&json!({
            "id": null,
            "yaml": null,
            "metadata": {
                "name": "io-latency",
                "namespace": "chaos-testing",
                "labels": {"app.kubernetes.io/part-of": "chaos"},
                "annotations": null
            },
            "spec": {
                "entry": "entry",
                "templates": [
                    {
                        "name": "entry",
                        "template_type": "IOChaos",
                        "deadline": "5m",
                        "io_chaos": {
                            "action": "latency",
                            "mode": "one",
                            "selector": {"label_selectors": {"app": "etcd"}},
                            "volume_path": "/var/run/etcd",
                            "delay": "100ms",
                            "percent": 50
                        }
                    }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_renders_manifest() {
        let state = WorkflowV1Alpha1ManifestDataSource.read(&config()).unwrap();

        assert_eq!(state.get_string("id"), Some("io-latency/chaos-testing".to_string()));
        let yaml = state.get_string("yaml").unwrap();
        let rendered: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(rendered["apiVersion"], json!("chaos-mesh.org/v1alpha1"));
        assert_eq!(rendered["kind"], json!("Workflow"));
        assert_eq!(rendered["metadata"]["name"], json!("io-latency"));
        assert_eq!(
            rendered["metadata"]["labels"],
            json!({"app.kubernetes.io/part-of": "chaos"})
        );
        assert_eq!(
            rendered["spec"]["templates"][0]["ioChaos"]["volumePath"],
            json!("/var/run/etcd")
        );
        assert_eq!(rendered["spec"]["templates"][0]["templateType"], json!("IOChaos"));
    }

    #[test]
    fn test_keeps_configured_attributes() {
        let state = WorkflowV1Alpha1ManifestDataSource.read(&config()).unwrap();
        assert_eq!(state.get("spec"), config().get("spec"));
        assert_eq!(state.get("metadata"), config().get("metadata"));
    }

    #[test]
    fn test_reports_marshal_error() {
        let mut config = config();
        config.set("spec", json!({"templates": []}));

        let diags = WorkflowV1Alpha1ManifestDataSource.read(&config).unwrap_err();

        assert_eq!(diags[0].summary, "Unable to marshal resource");
    }

    #[test]
    fn test_validate_rejects_computed_yaml() {
        let mut config = config();
        config.set("yaml", json!("kind: Workflow"));

        let diags = WorkflowV1Alpha1ManifestDataSource.validate(&config);

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Invalid configuration for read-only attribute");
    }
}
