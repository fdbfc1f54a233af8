//! Builds the ConfigMap holding `targetallocator.yaml`, the target allocator's own config file.

use std::collections::BTreeMap;

use serde::Serialize;
use snafu::{ensure, ResultExt, Snafu};
use stackable_operator::k8s_openapi::{
    api::core::v1::ConfigMap, apimachinery::pkg::apis::meta::v1::LabelSelector,
};

use crate::{labels, naming};

use super::Params;

pub const CONFIG_FILE_NAME: &str = "targetallocator.yaml";

/// Where the serving certificate secret is mounted into the target allocator container.
pub const TLS_DIR: &str = "/tls";
pub const HTTPS_LISTEN_ADDR: &str = ":8443";

const COLLECTOR_COMPONENT: &str = "opentelemetry-collector";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("scrape config #{index} must be a mapping with a string job_name"))]
    InvalidScrapeConfig { index: usize },

    #[snafu(display("failed to serialize {CONFIG_FILE_NAME}"))]
    SerializeConfig { source: serde_yaml::Error },
}
type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Serialize)]
struct TargetAllocatorConfig<'a> {
    collector_selector: CollectorSelector,
    allocation_strategy: String,
    filter_strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PrometheusConfig<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prometheus_cr: Option<PrometheusCr<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    https: Option<Https>,
}

#[derive(Serialize)]
struct CollectorSelector {
    matchlabels: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct PrometheusConfig<'a> {
    scrape_configs: &'a [serde_json::Value],
}

#[derive(Serialize)]
struct PrometheusCr<'a> {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    scrape_interval: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_monitor_selector: Option<&'a LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pod_monitor_selector: Option<&'a LabelSelector>,
}

#[derive(Serialize)]
struct Https {
    enabled: bool,
    listen_addr: &'static str,
    ca_file_path: String,
    tls_cert_file_path: String,
    tls_key_file_path: String,
}

pub fn build(params: &Params<'_>) -> Result<ConfigMap> {
    let name = naming::ta_config_map(params.name());
    let data = [(CONFIG_FILE_NAME.to_string(), config_file(params)?)].into();
    Ok(ConfigMap {
        metadata: params.object_meta(name.clone(), params.labels(&name)),
        data: Some(data),
        ..ConfigMap::default()
    })
}

/// Renders the contents of [`CONFIG_FILE_NAME`], validating the scrape configs on the way.
pub fn config_file(params: &Params<'_>) -> Result<String> {
    let spec = params.spec();
    for (index, scrape_config) in spec.scrape_configs.iter().enumerate() {
        ensure!(
            scrape_config
                .get("job_name")
                .is_some_and(serde_json::Value::is_string),
            InvalidScrapeConfigSnafu { index }
        );
    }

    let config = TargetAllocatorConfig {
        collector_selector: CollectorSelector {
            matchlabels: labels::selector_labels(params.meta(), COLLECTOR_COMPONENT),
        },
        allocation_strategy: spec.allocation_strategy.to_string(),
        filter_strategy: spec.filter_strategy.to_string(),
        config: (!spec.scrape_configs.is_empty()).then(|| PrometheusConfig {
            scrape_configs: &spec.scrape_configs,
        }),
        prometheus_cr: spec.prometheus_cr.enabled.then(|| PrometheusCr {
            enabled: true,
            scrape_interval: spec.prometheus_cr.scrape_interval.as_deref(),
            service_monitor_selector: spec.prometheus_cr.service_monitor_selector.as_ref(),
            pod_monitor_selector: spec.prometheus_cr.pod_monitor_selector.as_ref(),
        }),
        https: params.mtls_enabled().then(|| Https {
            enabled: true,
            listen_addr: HTTPS_LISTEN_ADDR,
            ca_file_path: format!("{TLS_DIR}/ca.crt"),
            tls_cert_file_path: format!("{TLS_DIR}/tls.crt"),
            tls_key_file_path: format!("{TLS_DIR}/tls.key"),
        }),
    };
    serde_yaml::to_string(&config).context(SerializeConfigSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{CertManagerAvailability, OperatorConfig},
        manifests::tests::target_allocator,
    };

    fn parsed_config(cm: &ConfigMap) -> serde_yaml::Value {
        serde_yaml::from_str(&cm.data.as_ref().unwrap()[CONFIG_FILE_NAME]).unwrap()
    }

    #[test]
    fn minimal_config() {
        let ta = target_allocator("spec: {}");
        let config = OperatorConfig::default();
        let cm = build(&Params::new(&ta, &config).unwrap()).unwrap();

        assert_eq!(cm.metadata.name.as_deref(), Some("my-col-targetallocator"));
        let file = parsed_config(&cm);
        assert_eq!(file["allocation_strategy"], "consistent-hashing");
        assert_eq!(file["filter_strategy"], "relabel-config");
        assert_eq!(
            file["collector_selector"]["matchlabels"]["app.kubernetes.io/component"],
            "opentelemetry-collector"
        );
        assert_eq!(
            file["collector_selector"]["matchlabels"]["app.kubernetes.io/instance"],
            "obs.my-col"
        );
        assert!(file.get("config").is_none());
        assert!(file.get("prometheus_cr").is_none());
        assert!(file.get("https").is_none());
    }

    #[test]
    fn scrape_configs_and_prometheus_cr() {
        let ta = target_allocator(
            r#"
spec:
  allocationStrategy: per-node
  scrapeConfigs:
    - job_name: kubelet
      scrape_interval: 10s
  prometheusCr:
    enabled: true
    scrapeInterval: 30s
    serviceMonitorSelector:
      matchLabels:
        team: observability
"#,
        );
        let config = OperatorConfig::default();
        let file = parsed_config(&build(&Params::new(&ta, &config).unwrap()).unwrap());

        assert_eq!(file["allocation_strategy"], "per-node");
        assert_eq!(file["config"]["scrape_configs"][0]["job_name"], "kubelet");
        assert_eq!(file["prometheus_cr"]["enabled"], true);
        assert_eq!(file["prometheus_cr"]["scrape_interval"], "30s");
        assert_eq!(
            file["prometheus_cr"]["service_monitor_selector"]["matchLabels"]["team"],
            "observability"
        );
    }

    #[test]
    fn https_settings_under_mtls() {
        let ta = target_allocator("spec: {}");
        let config = OperatorConfig {
            cert_manager_availability: CertManagerAvailability::Available,
            enable_target_allocator_mtls: true,
            ..OperatorConfig::default()
        };
        let file = parsed_config(&build(&Params::new(&ta, &config).unwrap()).unwrap());

        assert_eq!(file["https"]["enabled"], true);
        assert_eq!(file["https"]["listen_addr"], ":8443");
        assert_eq!(file["https"]["ca_file_path"], "/tls/ca.crt");
        assert_eq!(file["https"]["tls_cert_file_path"], "/tls/tls.crt");
        assert_eq!(file["https"]["tls_key_file_path"], "/tls/tls.key");
    }

    #[test]
    fn rejects_scrape_config_without_job_name() {
        let ta = target_allocator(
            r#"
spec:
  scrapeConfigs:
    - job_name: ok
    - static_configs: []
"#,
        );
        let config = OperatorConfig::default();
        assert!(matches!(
            build(&Params::new(&ta, &config).unwrap()),
            Err(Error::InvalidScrapeConfig { index: 1 })
        ));
    }
}
