//! See [`Params`]

use std::collections::BTreeMap;

use snafu::{OptionExt, Snafu};
use stackable_operator::kube::api::ObjectMeta;

use crate::{
    config::{CertManagerAvailability, OperatorConfig},
    crd::{TargetAllocator, TargetAllocatorSpec},
    labels,
};

/// `app.kubernetes.io/component` of all objects generated for a target allocator.
pub const COMPONENT: &str = "opentelemetry-targetallocator";

#[derive(Debug, Snafu)]
pub enum ParamsError {
    #[snafu(display("TargetAllocator has no name"))]
    NoName,

    #[snafu(display("TargetAllocator has no namespace"))]
    NoNamespace,
}

/// Everything the manifest builders read: a TargetAllocator and the operator configuration.
///
/// Borrowed for the duration of a single [`build`](super::build), nothing in here is modified.
#[derive(Clone, Copy, Debug)]
pub struct Params<'a> {
    target_allocator: &'a TargetAllocator,
    config: &'a OperatorConfig,
    name: &'a str,
    namespace: &'a str,
}

impl<'a> Params<'a> {
    pub fn new(
        target_allocator: &'a TargetAllocator,
        config: &'a OperatorConfig,
    ) -> Result<Self, ParamsError> {
        let meta = &target_allocator.metadata;
        Ok(Self {
            target_allocator,
            config,
            name: meta
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .context(NoNameSnafu)?,
            namespace: meta
                .namespace
                .as_deref()
                .filter(|ns| !ns.is_empty())
                .context(NoNamespaceSnafu)?,
        })
    }

    pub fn target_allocator(&self) -> &'a TargetAllocator {
        self.target_allocator
    }

    pub fn spec(&self) -> &'a TargetAllocatorSpec {
        &self.target_allocator.spec
    }

    pub fn meta(&self) -> &'a ObjectMeta {
        &self.target_allocator.metadata
    }

    pub fn config(&self) -> &'a OperatorConfig {
        self.config
    }

    /// Name of the TargetAllocator instance, all object names are derived from it.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    pub fn enabled(&self) -> bool {
        self.spec().enabled
    }

    pub fn service_monitor_enabled(&self) -> bool {
        self.spec().observability.metrics.enable_metrics
            && self.config.feature_gates.prometheus_operator_is_available
    }

    /// mTLS is only set up if cert-manager can issue the certificates.
    pub fn mtls_enabled(&self) -> bool {
        self.config.cert_manager_availability() == CertManagerAvailability::Available
            && self.config.enable_target_allocator_mtls()
    }

    /// Labels for an object called `name`, honouring the operator's label filter.
    pub fn labels(&self, name: &str) -> BTreeMap<String, String> {
        labels::labels(
            self.meta(),
            name,
            &self.spec().image,
            COMPONENT,
            &self.config.labels_filter,
        )
    }

    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        labels::selector_labels(self.meta(), COMPONENT)
    }

    /// Metadata for a namespaced object called `name` with the given `labels`.
    pub fn object_meta(&self, name: String, labels: BTreeMap<String, String>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name),
            namespace: Some(self.namespace.to_string()),
            labels: Some(labels),
            ..ObjectMeta::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::FeatureGates, manifests::tests::target_allocator};

    #[test]
    fn requires_name_and_namespace() {
        let config = OperatorConfig::default();
        let mut ta = target_allocator("spec: {}");
        ta.metadata.namespace = None;
        assert!(matches!(
            Params::new(&ta, &config),
            Err(ParamsError::NoNamespace)
        ));
        ta.metadata.name = Some(String::new());
        assert!(matches!(Params::new(&ta, &config), Err(ParamsError::NoName)));
    }

    #[test]
    fn mtls_requires_cert_manager() {
        let ta = target_allocator("spec: {}");
        let mut config = OperatorConfig {
            enable_target_allocator_mtls: true,
            ..OperatorConfig::default()
        };
        assert!(!Params::new(&ta, &config).unwrap().mtls_enabled());
        config.cert_manager_availability = CertManagerAvailability::Available;
        assert!(Params::new(&ta, &config).unwrap().mtls_enabled());
        config.enable_target_allocator_mtls = false;
        assert!(!Params::new(&ta, &config).unwrap().mtls_enabled());
    }

    #[test]
    fn service_monitor_requires_feature_gate() {
        let ta = target_allocator(
            r#"
spec:
  observability:
    metrics:
      enableMetrics: true
"#,
        );
        let mut config = OperatorConfig::default();
        assert!(!Params::new(&ta, &config).unwrap().service_monitor_enabled());
        config.feature_gates = FeatureGates {
            prometheus_operator_is_available: true,
        };
        assert!(Params::new(&ta, &config).unwrap().service_monitor_enabled());
    }
}
