//! Terraform Data Sources for Chaos Mesh

mod workflow_v1alpha1_manifest;

pub use workflow_v1alpha1_manifest::WorkflowV1Alpha1ManifestDataSource;

use crate::resources::{ResourceResult, ResourceState};
use crate::schema::{Diagnostic, ResourceSchema};

/// Data source trait
///
/// Data sources here are computed locally and never reach the cluster, so
/// they keep working when the provider is offline.
pub trait DataSource: Send + Sync {
    /// Data source type name
    fn type_name(&self) -> &str;

    /// Get the schema for this data source
    fn schema(&self) -> ResourceSchema;

    /// Compute the state for a configuration
    fn read(&self, config: &ResourceState) -> ResourceResult<ResourceState>;

    /// Validate a configuration against the schema
    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        self.schema().block.validate(&config.to_value())
    }
}

/// Get all available data sources
pub fn get_all_data_sources() -> Vec<Box<dyn DataSource>> {
    vec![Box::new(WorkflowV1Alpha1ManifestDataSource)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let data_sources = get_all_data_sources();
        assert_eq!(data_sources.len(), 1);
        assert_eq!(
            data_sources[0].type_name(),
            "chaosmesh_workflow_v1alpha1_manifest"
        );
    }
}
