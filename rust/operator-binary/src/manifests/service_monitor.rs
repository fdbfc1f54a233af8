use stackable_operator::k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use crate::{
    external_crd::prometheus_operator::{
        Endpoint, NamespaceSelector, ServiceMonitor, ServiceMonitorSpec,
    },
    naming,
};

use super::{service, Params};

/// Lets prometheus-operator scrape the target allocator's own metrics.
pub fn build(params: &Params<'_>) -> Option<ServiceMonitor> {
    let name = naming::ta_service_monitor(params.name());
    Some(ServiceMonitor {
        metadata: params.object_meta(name.clone(), params.labels(&name)),
        spec: ServiceMonitorSpec {
            endpoints: vec![Endpoint {
                port: service::PORT_NAME.to_string(),
                path: Some("/metrics".to_string()),
            }],
            selector: LabelSelector {
                match_labels: Some(params.selector_labels()),
                ..LabelSelector::default()
            },
            namespace_selector: Some(NamespaceSelector {
                match_names: vec![params.namespace().to_string()],
            }),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::OperatorConfig, manifests::tests::target_allocator};

    #[test]
    fn scrapes_service_port() {
        let ta = target_allocator("spec: {}");
        let config = OperatorConfig::default();
        let params = Params::new(&ta, &config).unwrap();
        let monitor = serde_json::to_value(build(&params).unwrap()).unwrap();

        assert_eq!(monitor["apiVersion"], "monitoring.coreos.com/v1");
        assert_eq!(monitor["kind"], "ServiceMonitor");
        assert_eq!(monitor["metadata"]["name"], "my-col-targetallocator");
        assert_eq!(monitor["spec"]["endpoints"][0]["port"], "targetallocation");
        assert_eq!(monitor["spec"]["namespaceSelector"]["matchNames"][0], "obs");
        assert_eq!(
            monitor["spec"]["selector"]["matchLabels"]["app.kubernetes.io/component"],
            "opentelemetry-targetallocator"
        );
    }
}
