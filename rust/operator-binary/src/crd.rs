use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackable_operator::{
    k8s_openapi::{
        api::core::v1::{ResourceRequirements, Toleration},
        apimachinery::pkg::{apis::meta::v1::LabelSelector, util::intstr::IntOrString},
    },
    kube::CustomResource,
    schemars::{self, JsonSchema},
};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    group = "opentelemetry.io",
    version = "v1alpha1",
    kind = "TargetAllocator",
    namespaced,
    derive = "PartialEq",
    crates(
        kube_core = "stackable_operator::kube::core",
        k8s_openapi = "stackable_operator::k8s_openapi",
        schemars = "stackable_operator::schemars"
    )
)]
#[serde(rename_all = "camelCase")]
pub struct TargetAllocatorSpec {
    /// Whether the owning collector wants a target allocator at all.
    /// No objects are generated while this is `false`.
    #[serde(default = "TargetAllocatorSpec::default_enabled")]
    pub enabled: bool,

    /// Container image of the target allocator.
    /// Falls back to the operator-wide default image if empty.
    #[serde(default)]
    pub image: String,

    pub replicas: Option<i32>,

    /// Name of an existing ServiceAccount to run as.
    /// If empty, a dedicated ServiceAccount is created.
    #[serde(default)]
    pub service_account: String,

    #[serde(default)]
    pub allocation_strategy: AllocationStrategy,

    #[serde(default)]
    pub filter_strategy: FilterStrategy,

    /// Static Prometheus scrape configs, each entry is a regular Prometheus `scrape_config`.
    #[serde(default)]
    #[schemars(schema_with = "scrape_configs_schema")]
    pub scrape_configs: Vec<serde_json::Value>,

    #[serde(default)]
    pub prometheus_cr: PrometheusCrConfig,

    #[serde(default)]
    pub observability: ObservabilitySpec,

    /// Only honoured for allocation strategies that keep targets sticky to collectors
    /// (`consistent-hashing` and `per-node`).
    pub pod_disruption_budget: Option<PodDisruptionBudgetSpec>,

    pub resources: Option<ResourceRequirements>,

    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,

    #[serde(default)]
    pub tolerations: Vec<Toleration>,
}

impl TargetAllocatorSpec {
    fn default_enabled() -> bool {
        true
    }
}

fn scrape_configs_schema(_: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    serde_json::from_value(serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "x-kubernetes-preserve-unknown-fields": true,
        },
    }))
    .expect("scrape config schema is a valid JSON schema")
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AllocationStrategy {
    LeastWeighted,
    #[default]
    ConsistentHashing,
    PerNode,
}

impl AllocationStrategy {
    /// Strategies that move as few targets as possible when collectors come and go,
    /// which makes limiting voluntary disruptions worthwhile.
    pub fn is_sticky(self) -> bool {
        matches!(self, Self::ConsistentHashing | Self::PerNode)
    }
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FilterStrategy {
    #[default]
    RelabelConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusCrConfig {
    /// Discover scrape targets from prometheus-operator `ServiceMonitor` and `PodMonitor` objects.
    #[serde(default)]
    pub enabled: bool,

    /// Default scrape interval for discovered monitors, for example `30s`.
    pub scrape_interval: Option<String>,

    pub service_monitor_selector: Option<LabelSelector>,

    pub pod_monitor_selector: Option<LabelSelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObservabilitySpec {
    #[serde(default)]
    pub metrics: MetricsConfigSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfigSpec {
    /// Create a `ServiceMonitor` for the target allocator, if prometheus-operator is available.
    #[serde(default)]
    pub enable_metrics: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodDisruptionBudgetSpec {
    pub min_available: Option<IntOrString>,
    pub max_unavailable: Option<IntOrString>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_minimal_resource() {
        let ta: TargetAllocator = serde_yaml::from_str(
            r#"
apiVersion: opentelemetry.io/v1alpha1
kind: TargetAllocator
metadata:
  name: my-col
  namespace: obs
spec: {}
"#,
        )
        .unwrap();
        assert!(ta.spec.enabled);
        assert_eq!(
            ta.spec.allocation_strategy,
            AllocationStrategy::ConsistentHashing
        );
        assert_eq!(ta.spec.filter_strategy, FilterStrategy::RelabelConfig);
        assert!(!ta.spec.observability.metrics.enable_metrics);
        assert!(ta.spec.scrape_configs.is_empty());
    }

    #[test]
    fn allocation_strategy_names() {
        assert_eq!(
            AllocationStrategy::LeastWeighted.to_string(),
            "least-weighted"
        );
        assert_eq!(
            serde_yaml::from_str::<AllocationStrategy>("per-node").unwrap(),
            AllocationStrategy::PerNode
        );
        assert!(AllocationStrategy::PerNode.is_sticky());
        assert!(!AllocationStrategy::LeastWeighted.is_sticky());
    }
}
