//! Kubernetes API Client for Terraform Provider
//!
//! Resources never touch kube-rs directly; they go through [`KubernetesClient`]
//! so that the transport can be swapped in tests.

use async_trait::async_trait;
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use thiserror::Error;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("Invalid kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
    #[error("Unable to infer Kubernetes configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Dynamic access to namespaced custom resources
#[async_trait]
pub trait KubernetesClient: Send + Sync {
    /// Server-side apply `object` as `name` in `namespace`
    async fn apply(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
        object: &DynamicObject,
        params: &PatchParams,
    ) -> Result<DynamicObject>;

    /// Fetch the current object
    async fn get(&self, resource: &ApiResource, namespace: &str, name: &str) -> Result<DynamicObject>;

    /// Delete the object
    async fn delete(&self, resource: &ApiResource, namespace: &str, name: &str) -> Result<()>;
}

/// Where the kube-rs configuration comes from
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Path to a kubeconfig file; the inference chain is used when unset
    pub kubeconfig: Option<String>,
    /// Context inside the kubeconfig
    pub context: Option<String>,
}

/// kube-rs backed client
#[derive(Clone)]
pub struct KubeClient {
    inner: Client,
}

impl KubeClient {
    /// Wrap an existing kube-rs client
    pub fn new(inner: Client) -> Self {
        Self { inner }
    }

    /// Build a client from a kubeconfig file or the default inference chain.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn connect(options: &ConnectionOptions) -> Result<Self> {
        let config = match &options.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(
                    kubeconfig,
                    &KubeConfigOptions {
                        context: options.context.clone(),
                        ..Default::default()
                    },
                )
                .await?
            }
            None if options.context.is_some() => {
                Config::from_kubeconfig(&KubeConfigOptions {
                    context: options.context.clone(),
                    ..Default::default()
                })
                .await?
            }
            None => Config::infer().await?,
        };

        tracing::debug!(cluster_url = %config.cluster_url, "Connecting to Kubernetes");
        let inner = Client::try_from(config)?;
        Ok(Self::new(inner))
    }

    fn api(&self, resource: &ApiResource, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.inner.clone(), namespace, resource)
    }
}

#[async_trait]
impl KubernetesClient for KubeClient {
    async fn apply(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
        object: &DynamicObject,
        params: &PatchParams,
    ) -> Result<DynamicObject> {
        let applied = self
            .api(resource, namespace)
            .patch(name, params, &Patch::Apply(object))
            .await?;
        Ok(applied)
    }

    async fn get(&self, resource: &ApiResource, namespace: &str, name: &str) -> Result<DynamicObject> {
        Ok(self.api(resource, namespace).get(name).await?)
    }

    async fn delete(&self, resource: &ApiResource, namespace: &str, name: &str) -> Result<()> {
        self.api(resource, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

/// Server-side apply parameters for a field manager
pub fn apply_params(field_manager: &str, force_conflicts: bool) -> PatchParams {
    let params = PatchParams::apply(field_manager);
    if force_conflicts {
        params.force()
    } else {
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_params() {
        let params = apply_params("terraform-provider-chaosmesh", false);
        assert_eq!(params.field_manager.as_deref(), Some("terraform-provider-chaosmesh"));
        assert!(!params.force);

        let forced = apply_params("manager", true);
        assert!(forced.force);
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Kube(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "workflows.chaos-mesh.org \"wf\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        }));
        assert!(err.to_string().contains("not found"));
    }
}
